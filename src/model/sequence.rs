use super::SequenceRef;
use crate::error::{Error, Result};

/// Numeric behaviour of a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "builders have no effect until used"]
pub struct SequenceDescriptor {
    pub start: i64,
    pub increment: i64,
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub cyclic: bool,
}

impl Default for SequenceDescriptor {
    fn default() -> Self {
        Self {
            start: 1,
            increment: 1,
            min: None,
            max: None,
            cyclic: false,
        }
    }
}

impl SequenceDescriptor {
    pub fn new(start: i64, increment: i64) -> Self {
        Self {
            start,
            increment,
            ..Self::default()
        }
    }

    pub fn min(mut self, min: i64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: i64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn cyclic(mut self) -> Self {
        self.cyclic = true;
        self
    }

    /// increment != 0 and min <= start <= max.
    pub fn validate(&self) -> Result<()> {
        if self.increment == 0 {
            return Err(Error::InvalidModel("sequence increment must not be zero".into()));
        }
        if let Some(min) = self.min {
            if self.start < min {
                return Err(Error::InvalidModel(format!(
                    "sequence start {} is below minimum {}",
                    self.start, min
                )));
            }
        }
        if let Some(max) = self.max {
            if self.start > max {
                return Err(Error::InvalidModel(format!(
                    "sequence start {} is above maximum {}",
                    self.start, max
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    pub(super) reference: SequenceRef,
    pub descriptor: SequenceDescriptor,
}

impl Sequence {
    pub fn name(&self) -> &str {
        &self.reference.name
    }

    pub fn reference(&self) -> &SequenceRef {
        &self.reference
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(SequenceDescriptor::new(1, 0).validate().is_err());
        assert!(SequenceDescriptor::new(5, 1).min(10).validate().is_err());
        assert!(SequenceDescriptor::new(5, -1).max(4).validate().is_err());
        assert!(SequenceDescriptor::new(5, -1).min(1).max(5).cyclic().validate().is_ok());
    }
}
