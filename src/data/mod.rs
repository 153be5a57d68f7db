//! Labeled email corpora: loading and train/test splitting

pub mod csv;
pub mod split;

pub use self::split::{train_test_split, Split, SplitConfig, Subset};

use crate::core::{Dataset, Label, RawExample};

/// Ordered, immutable collection of labeled emails
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    examples: Vec<RawExample>,
}

impl Corpus {
    pub fn new(examples: Vec<RawExample>) -> Self {
        Self { examples }
    }

    /// Build a corpus from parallel text/label slices (`label_num` encoding)
    pub fn from_pairs<S: AsRef<str>>(texts: &[S], labels: &[u8]) -> crate::core::Result<Self> {
        if texts.len() != labels.len() {
            return Err(crate::core::SpamHamError::DimensionMismatch {
                expected: texts.len(),
                actual: labels.len(),
            });
        }
        let examples = texts
            .iter()
            .zip(labels.iter())
            .map(|(text, &label)| Ok(RawExample::new(text.as_ref(), Label::try_from(label)?)))
            .collect::<crate::core::Result<Vec<_>>>()?;
        Ok(Self { examples })
    }

    pub fn examples(&self) -> &[RawExample] {
        &self.examples
    }

    /// Same corpus with every text passed through `f`
    pub fn map_texts<F: Fn(&str) -> String>(&self, f: F) -> Self {
        Self {
            examples: self
                .examples
                .iter()
                .map(|e| RawExample::new(f(&e.text), e.label))
                .collect(),
        }
    }

    /// Number of (ham, spam) examples
    pub fn label_counts(&self) -> (usize, usize) {
        let spam = self
            .examples
            .iter()
            .filter(|e| e.label == Label::Spam)
            .count();
        (self.examples.len() - spam, spam)
    }
}

impl Dataset for Corpus {
    fn len(&self) -> usize {
        self.examples.len()
    }

    fn get_example(&self, i: usize) -> &RawExample {
        &self.examples[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pairs() {
        let corpus = Corpus::from_pairs(&["buy now", "lunch?"], &[1, 0]).unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.get_labels(), vec![Label::Spam, Label::Ham]);
        assert_eq!(corpus.label_counts(), (1, 1));
    }

    #[test]
    fn test_from_pairs_rejects_bad_input() {
        assert!(Corpus::from_pairs(&["a"], &[1, 0]).is_err());
        assert!(Corpus::from_pairs(&["a"], &[3]).is_err());
    }

    #[test]
    fn test_map_texts_keeps_labels() {
        let corpus = Corpus::from_pairs(&["A", "B"], &[0, 1]).unwrap();
        let lowered = corpus.map_texts(|t| t.to_lowercase());
        assert_eq!(lowered.get_texts(), vec!["a", "b"]);
        assert_eq!(lowered.get_labels(), corpus.get_labels());
    }
}
