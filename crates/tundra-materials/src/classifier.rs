//! Keyword-based classification of texture layers into material classes.
//!
//! The keyword lists come from [`MaterialKeywordConfig`] and are compiled once into a
//! [`MaterialClassifier`], which is then shared by every sampler.

use tundra_config::{MaterialKeywordConfig, MaterialKeywords};

use crate::WeightVector;

/// The material class a texture layer contributes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MaterialClass {
    /// Snow and ice.
    Snow,
    /// Ash and volcanic soil.
    Ash,
    /// Mud and dirt.
    Mud,
    /// Everything else.
    Rock,
}

impl MaterialClass {
    /// The pure weight of this class.
    pub fn weight(self) -> WeightVector {
        match self {
            MaterialClass::Snow => WeightVector::SNOW,
            MaterialClass::Ash => WeightVector::ASH,
            MaterialClass::Mud => WeightVector::MUD,
            MaterialClass::Rock => WeightVector::ROCK,
        }
    }
}

/// Lower-cased include/exclude lists for one class.
#[derive(Clone, Debug, Default)]
struct KeywordSet {
    include: Vec<String>,
    exclude: Vec<String>,
}

impl KeywordSet {
    fn from_config(keywords: &MaterialKeywords) -> Self {
        let lower = |list: &[String]| {
            list.iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect()
        };
        Self {
            include: lower(&keywords.include),
            exclude: lower(&keywords.exclude),
        }
    }

    fn matches(&self, name: &str) -> bool {
        self.include.iter().any(|k| name.contains(k.as_str()))
            && !self.exclude.iter().any(|k| name.contains(k.as_str()))
    }
}

/// Classifies texture names by case-insensitive keyword matching.
///
/// Classes are tried in the order snow, ash, mud; a name matching none of them is rock.
#[derive(Clone, Debug)]
pub struct MaterialClassifier {
    snow: KeywordSet,
    ash: KeywordSet,
    mud: KeywordSet,
}

impl MaterialClassifier {
    /// Compile the keyword lists of a configuration.
    pub fn new(config: &MaterialKeywordConfig) -> Self {
        Self {
            snow: KeywordSet::from_config(&config.snow),
            ash: KeywordSet::from_config(&config.ash),
            mud: KeywordSet::from_config(&config.mud),
        }
    }

    /// Classify a texture name or path.
    pub fn classify(&self, texture: &str) -> MaterialClass {
        let name = texture.to_lowercase();
        if self.snow.matches(&name) {
            MaterialClass::Snow
        } else if self.ash.matches(&name) {
            MaterialClass::Ash
        } else if self.mud.matches(&name) {
            MaterialClass::Mud
        } else {
            MaterialClass::Rock
        }
    }
}

impl Default for MaterialClassifier {
    fn default() -> Self {
        Self::new(&MaterialKeywordConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pure_classes() {
        let classifier = MaterialClassifier::default();
        assert_eq!(classifier.classify("textures/tx_snow_01.dds"), MaterialClass::Snow);
        assert_eq!(classifier.classify("tx_ash_02"), MaterialClass::Ash);
        assert_eq!(classifier.classify("tx_swamp_mud"), MaterialClass::Mud);
        assert_eq!(classifier.classify("tx_cobblestone"), MaterialClass::Rock);
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let classifier = MaterialClassifier::default();
        assert_eq!(classifier.classify("TX_SNOW_ICE"), MaterialClass::Snow);
        assert_eq!(classifier.classify("Volcanic_Plain"), MaterialClass::Ash);
    }

    #[test]
    fn test_composite_names_are_excluded() {
        let classifier = MaterialClassifier::default();
        assert_ne!(classifier.classify("tx_snow_grass"), MaterialClass::Snow);
        assert_ne!(classifier.classify("snow_rock_01"), MaterialClass::Snow);
        assert_eq!(classifier.classify("tx_ashtree_bark"), MaterialClass::Rock);
    }

    #[test]
    fn test_custom_keywords() {
        let mut config = MaterialKeywordConfig::default();
        config.mud.include.push("Clay".to_string());
        let classifier = MaterialClassifier::new(&config);
        assert_eq!(classifier.classify("red_clay"), MaterialClass::Mud);
    }

    #[test]
    fn test_empty_keywords_never_match() {
        let mut config = MaterialKeywordConfig::default();
        config.snow.include = vec![String::new(), "  ".to_string()];
        let classifier = MaterialClassifier::new(&config);
        assert_eq!(classifier.classify("anything"), MaterialClass::Rock);
    }

    #[test]
    fn test_class_weights_are_one_hot() {
        for class in [
            MaterialClass::Snow,
            MaterialClass::Ash,
            MaterialClass::Mud,
            MaterialClass::Rock,
        ] {
            let w = class.weight();
            assert_eq!(w.sum(), 1.0);
        }
    }
}
