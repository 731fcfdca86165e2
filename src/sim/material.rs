//! Physical materials
//!
//! A material is plain data copied onto each entity. Presets are read-only
//! constants; the copy an entity holds can be tweaked freely.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Named bundle of physical properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    /// Bounciness in [0, 1], left to game logic when resolving impacts
    pub elasticity: f64,
    /// Damping factor in [0, 1] applied while in contact (1 = no damping)
    pub friction: f64,
    /// Mass per unit area, >= 0
    pub density: f64,
    /// Attraction strength for magnet-aware game logic
    pub magnetism: f64,
}

impl Material {
    pub fn new(name: &str, elasticity: f64, friction: f64, density: f64, magnetism: f64) -> Self {
        Self {
            name: name.to_string(),
            elasticity,
            friction,
            density,
            magnetism,
        }
    }

    /// Reject values the integrator cannot work with
    pub fn validate(&self) -> Result<(), CoreError> {
        let invalid = |reason| CoreError::InvalidMaterial {
            name: self.name.clone(),
            reason,
        };
        if ![self.elasticity, self.friction, self.density, self.magnetism]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(invalid("values must be finite"));
        }
        if !(0.0..=1.0).contains(&self.elasticity) {
            return Err(invalid("elasticity must be in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.friction) {
            return Err(invalid("friction must be in [0, 1]"));
        }
        if self.density < 0.0 {
            return Err(invalid("density must be >= 0"));
        }
        Ok(())
    }
}

impl Default for Material {
    fn default() -> Self {
        presets::DEFAULT.to_material()
    }
}

/// Compile-time preset table
pub mod presets {
    use super::Material;

    /// `Material` owns a `String`, so presets are stored in this const-friendly form
    #[derive(Debug, Clone, Copy)]
    pub struct Preset {
        pub name: &'static str,
        pub elasticity: f64,
        pub friction: f64,
        pub density: f64,
        pub magnetism: f64,
    }

    impl Preset {
        pub fn to_material(&self) -> Material {
            Material::new(
                self.name,
                self.elasticity,
                self.friction,
                self.density,
                self.magnetism,
            )
        }
    }

    pub const DEFAULT: Preset = Preset {
        name: "default",
        elasticity: 0.5,
        friction: 0.85,
        density: 1.0,
        magnetism: 0.0,
    };
    pub const RUBBER: Preset = Preset {
        name: "rubber",
        elasticity: 0.9,
        friction: 0.7,
        density: 0.7,
        magnetism: 0.0,
    };
    pub const WOOD: Preset = Preset {
        name: "wood",
        elasticity: 0.3,
        friction: 0.6,
        density: 0.5,
        magnetism: 0.0,
    };
    pub const STEEL: Preset = Preset {
        name: "steel",
        elasticity: 0.1,
        friction: 0.8,
        density: 7.8,
        magnetism: 1.0,
    };
    pub const ICE: Preset = Preset {
        name: "ice",
        elasticity: 0.1,
        friction: 0.98,
        density: 0.9,
        magnetism: 0.0,
    };
    pub const GLASS: Preset = Preset {
        name: "glass",
        elasticity: 0.4,
        friction: 0.9,
        density: 2.5,
        magnetism: 0.0,
    };
    pub const SUPER_BALL: Preset = Preset {
        name: "super_ball",
        elasticity: 0.98,
        friction: 0.9,
        density: 0.1,
        magnetism: 0.0,
    };

    pub const ALL: [Preset; 7] = [DEFAULT, RUBBER, WOOD, STEEL, ICE, GLASS, SUPER_BALL];
}

/// Materials by name, seeded with the presets
#[derive(Debug, Clone, Default)]
pub struct MaterialRegistry {
    materials: HashMap<String, Material>,
}

impl MaterialRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry containing every preset
    pub fn with_presets() -> Self {
        let materials = presets::ALL
            .iter()
            .map(|p| (p.name.to_string(), p.to_material()))
            .collect();
        Self { materials }
    }

    pub fn get(&self, name: &str) -> Option<&Material> {
        self.materials.get(name)
    }

    /// Add a level-defined material
    pub fn register(&mut self, material: Material) -> Result<(), CoreError> {
        material.validate()?;
        if self.materials.contains_key(&material.name) {
            return Err(CoreError::DuplicateMaterial(material.name));
        }
        log::debug!("Registered material `{}`", material.name);
        self.materials.insert(material.name.clone(), material);
        Ok(())
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.materials.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        for preset in presets::ALL {
            assert!(preset.to_material().validate().is_ok(), "{}", preset.name);
        }
    }

    #[test]
    fn test_registry_lookup_and_duplicates() {
        let mut registry = MaterialRegistry::with_presets();
        assert_eq!(registry.len(), presets::ALL.len());
        assert_eq!(registry.get("ice").map(|m| m.friction), Some(0.98));

        let slime = Material::new("slime", 0.2, 0.3, 1.1, 0.0);
        registry.register(slime.clone()).unwrap();
        assert!(registry.names().contains(&"slime"));
        assert!(matches!(
            registry.register(slime),
            Err(CoreError::DuplicateMaterial(name)) if name == "slime"
        ));
    }

    #[test]
    fn test_invalid_material_rejected() {
        let mut registry = MaterialRegistry::new();
        let bad = Material::new("bad", 1.5, 0.5, 1.0, 0.0);
        assert!(matches!(
            registry.register(bad),
            Err(CoreError::InvalidMaterial { .. })
        ));
        let nan = Material::new("nan", 0.5, f64::NAN, 1.0, 0.0);
        assert!(nan.validate().is_err());
        let negative = Material::new("neg", 0.5, 0.5, -1.0, 0.0);
        assert!(negative.validate().is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_entity_copy_is_independent() {
        let mut mine = presets::RUBBER.to_material();
        mine.friction = 0.1;
        assert_eq!(presets::RUBBER.friction, 0.7);
        assert_eq!(Material::default().name, "default");
    }
}
