//! Record models and their links to parent models.

/// A record model and the fields that point at a parent model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelSchema {
    pub name: &'static str,
    /// `(field, target model)` pairs.
    pub foreign_keys: &'static [(&'static str, &'static str)],
}

impl ModelSchema {
    /// Field referencing `target`, if this model has one.
    pub fn foreign_key_to(&self, target: &str) -> Option<&'static str> {
        self.foreign_keys
            .iter()
            .find(|(_, model)| *model == target)
            .map(|(field, _)| *field)
    }
}

static MODELS: &[ModelSchema] = &[
    ModelSchema {
        name: "Service",
        foreign_keys: &[],
    },
    ModelSchema {
        name: "ServiceContact",
        foreign_keys: &[],
    },
    // Shared between services, layers and feature types.
    ModelSchema {
        name: "Keyword",
        foreign_keys: &[],
    },
    ModelSchema {
        name: "MimeType",
        foreign_keys: &[],
    },
    ModelSchema {
        name: "ReferenceSystem",
        foreign_keys: &[],
    },
    ModelSchema {
        name: "OperationUrl",
        foreign_keys: &[("service", "Service")],
    },
    ModelSchema {
        name: "Layer",
        foreign_keys: &[("service", "Service")],
    },
    ModelSchema {
        name: "FeatureType",
        foreign_keys: &[("service", "Service")],
    },
    ModelSchema {
        name: "Style",
        foreign_keys: &[("layer", "Layer")],
    },
    ModelSchema {
        name: "Dimension",
        foreign_keys: &[("layer", "Layer"), ("feature_type", "FeatureType")],
    },
];

pub fn model_schema(name: &str) -> Option<&'static ModelSchema> {
    MODELS.iter().find(|m| m.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_foreign_keys() {
        let dimension = model_schema("Dimension").unwrap();
        assert_eq!(dimension.foreign_key_to("Layer"), Some("layer"));
        assert_eq!(dimension.foreign_key_to("FeatureType"), Some("feature_type"));
        assert_eq!(model_schema("Keyword").unwrap().foreign_key_to("Service"), None);
        assert!(model_schema("Nope").is_none());
    }
}
