//! Label encoders for the categorical request columns.

use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use thiserror::Error;

/// A label that was not part of the classes an encoder was fitted on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("y contains previously unseen labels: '{label}'")]
pub struct UnknownLabel {
    pub label: String,
}

/// Fixed mapping from string labels to integer codes.
///
/// Classes are kept sorted and de-duplicated, and a label's code is its position in that order,
/// so two encoders fitted on the same label set always agree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelEncoder {
    classes: Vec<String>,
    codes: HashMap<String, i64>,
}

impl LabelEncoder {
    pub fn fit<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut classes: Vec<String> = labels.into_iter().map(Into::into).collect();
        classes.sort();
        classes.dedup();

        let codes = classes.iter().enumerate().map(|(code, label)| (label.clone(), code as i64)).collect();

        Self { classes, codes }
    }

    /// Known labels in code order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn encode(&self, label: &str) -> Result<i64, UnknownLabel> {
        self.codes.get(label).copied().ok_or_else(|| UnknownLabel { label: label.to_string() })
    }

    /// Encode every label, failing on the first one outside the fitted classes.
    pub fn transform<'a, I>(&self, labels: I) -> Result<Vec<i64>, UnknownLabel>
    where
        I: IntoIterator<Item = &'a str>,
    {
        labels.into_iter().map(|label| self.encode(label)).collect()
    }
}

impl<'de> Deserialize<'de> for LabelEncoder {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(deny_unknown_fields)]
        struct Fitted {
            classes: Vec<String>,
        }

        let fitted = Fitted::deserialize(deserializer)?;
        if fitted.classes.is_empty() {
            return Err(serde::de::Error::custom("encoder has no classes"));
        }
        Ok(LabelEncoder::fit(fitted.classes))
    }
}

/// The two encoders shipped together in the encoders artifact.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EncoderSet {
    pub room_encoder: LabelEncoder,
    pub type_encoder: LabelEncoder,
}
