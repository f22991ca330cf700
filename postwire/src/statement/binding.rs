use crate::{codec::Parameter, error::UsageError};

/// Parameter count of a `Bind` message is sent as 16 bit.
pub const MAX_PARAMS: usize = u16::MAX as usize;

/// Parameters of one execution, indexed from zero.
#[derive(Debug, Default, Clone)]
pub struct Binding {
    params: Vec<Option<Parameter>>,
}

impl Binding {
    /// Set the parameter at `index`, which must be below [`MAX_PARAMS`].
    pub fn set(&mut self, index: usize, param: Parameter) -> Result<(), UsageError> {
        if index >= MAX_PARAMS {
            return Err(UsageError::new(format!(
                "Parameter index {index} is out of range, a statement takes at most {MAX_PARAMS} parameters"
            )));
        }
        if self.params.len() <= index {
            self.params.resize(index + 1, None);
        }
        self.params[index] = Some(param);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Returns every parameter, fails when an index below the highest one is not set.
    fn seal(self) -> Result<Vec<Parameter>, UsageError> {
        self.params
            .into_iter()
            .enumerate()
            .map(|(index, param)| {
                param.ok_or_else(|| {
                    UsageError::new(format!("No parameter specified for index {index}"))
                })
            })
            .collect()
    }
}

/// Accumulated bindings of a statement, one execution per binding.
#[derive(Debug, Default)]
pub struct Bindings {
    current: Binding,
    sealed: Vec<Vec<Parameter>>,
}

impl Bindings {
    pub fn current(&mut self) -> &mut Binding {
        &mut self.current
    }

    /// Seal the current binding and start a new one.
    pub fn add(&mut self) -> Result<(), UsageError> {
        let binding = std::mem::take(&mut self.current);
        self.sealed.push(binding.seal()?);
        Ok(())
    }

    /// Returns every binding, the current one is sealed when it is not empty.
    pub fn finish(mut self) -> Result<Vec<Vec<Parameter>>, UsageError> {
        if !self.current.is_empty() {
            self.add()?;
        }
        if self.sealed.is_empty() {
            return Err(UsageError::new("No parameters have been bound"));
        }
        Ok(self.sealed)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::postgres::{PgFormat, oid};

    fn param(value: &'static str) -> Parameter {
        Parameter::new(PgFormat::Text, oid::TEXT, value)
    }

    #[test]
    fn seal_bindings() {
        let mut bindings = Bindings::default();
        bindings.current().set(1, param("b")).unwrap();
        bindings.current().set(0, param("a")).unwrap();
        bindings.add().unwrap();
        bindings.current().set(0, param("c")).unwrap();
        bindings.current().set(1, param("d")).unwrap();

        let sealed = bindings.finish().unwrap();
        assert_eq!(sealed.len(), 2);
        assert_eq!(sealed[0], vec![param("a"), param("b")]);
        assert_eq!(sealed[1], vec![param("c"), param("d")]);
    }

    #[test]
    fn gap_names_missing_index() {
        let mut bindings = Bindings::default();
        bindings.current().set(0, param("a")).unwrap();
        bindings.current().set(2, param("c")).unwrap();
        let err = bindings.add().unwrap_err();
        assert_eq!(err.message(), "No parameter specified for index 1");
    }

    #[test]
    fn index_limit() {
        let mut binding = Binding::default();
        let err = binding.set(usize::MAX, param("a")).unwrap_err();
        assert_eq!(
            err.message(),
            format!(
                "Parameter index {} is out of range, a statement takes at most 65535 parameters",
                usize::MAX
            )
        );
        assert!(binding.set(MAX_PARAMS, param("a")).is_err());
        assert!(binding.is_empty());
        binding.set(MAX_PARAMS - 1, param("a")).unwrap();
    }

    #[test]
    fn empty_bindings() {
        let err = Bindings::default().finish().unwrap_err();
        assert_eq!(err.message(), "No parameters have been bound");
    }
}
