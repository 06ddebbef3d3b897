//! Pipes
//!
//! Corresponds to angular2/src/core/change_detection/pipes.ts and
//! angular2/src/core/pipes/pipes.ts

use crate::change_detection::exceptions::{ChangeDetectionError, Result};
use crate::change_detection::value::Value;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

pub trait PipeTransform {
    fn transform(&mut self, value: &Value, args: &[Value]) -> Result<Value>;

    /// Called when the detector holding the pipe is dehydrated.
    fn on_destroy(&mut self) {}
}

/// A resolved pipe instance and whether its output depends only on its inputs.
#[derive(Clone)]
pub struct SelectedPipe {
    pub pipe: Rc<RefCell<dyn PipeTransform>>,
    pub pure: bool,
}

impl SelectedPipe {
    pub fn new(pipe: impl PipeTransform + 'static, pure: bool) -> Self {
        SelectedPipe {
            pipe: Rc::new(RefCell::new(pipe)),
            pure,
        }
    }

    pub fn transform(&self, value: &Value, args: &[Value]) -> Result<Value> {
        self.pipe.borrow_mut().transform(value, args)
    }

    pub fn on_destroy(&self) {
        self.pipe.borrow_mut().on_destroy();
    }
}

impl fmt::Debug for SelectedPipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedPipe").field("pure", &self.pure).finish()
    }
}

pub trait Pipes {
    fn get(&self, name: &str) -> Result<SelectedPipe>;
}

type PipeFactory = Box<dyn Fn() -> Rc<RefCell<dyn PipeTransform>>>;

struct PipeProvider {
    factory: PipeFactory,
    pure: bool,
}

/// Pipes of one view. Pure pipes are instantiated once and shared between
/// bindings; impure pipes get one instance per request.
#[derive(Default)]
pub struct PipeRegistry {
    providers: IndexMap<String, PipeProvider>,
    pure_instances: RefCell<IndexMap<String, SelectedPipe>>,
}

impl PipeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<P, F>(&mut self, name: impl Into<String>, pure: bool, factory: F) -> &mut Self
    where
        P: PipeTransform + 'static,
        F: Fn() -> P + 'static,
    {
        self.providers.insert(
            name.into(),
            PipeProvider {
                factory: Box::new(move || -> Rc<RefCell<dyn PipeTransform>> {
                    Rc::new(RefCell::new(factory()))
                }),
                pure,
            },
        );
        self
    }
}

impl Pipes for PipeRegistry {
    fn get(&self, name: &str) -> Result<SelectedPipe> {
        if let Some(cached) = self.pure_instances.borrow().get(name) {
            return Ok(cached.clone());
        }
        let provider = self
            .providers
            .get(name)
            .ok_or_else(|| ChangeDetectionError::PipeNotFound(name.to_string()))?;
        let selected = SelectedPipe {
            pipe: (provider.factory)(),
            pure: provider.pure,
        };
        if provider.pure {
            self.pure_instances
                .borrow_mut()
                .insert(name.to_string(), selected.clone());
        }
        tracing::trace!(pipe = name, pure = provider.pure, "instantiated pipe");
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Upper;

    impl PipeTransform for Upper {
        fn transform(&mut self, value: &Value, _args: &[Value]) -> Result<Value> {
            Ok(Value::string(value.to_string().to_uppercase()))
        }
    }

    #[test]
    fn test_pure_pipes_are_shared() {
        let mut registry = PipeRegistry::new();
        registry.register("upper", true, || Upper);
        registry.register("impureUpper", false, || Upper);

        let a = registry.get("upper").unwrap();
        let b = registry.get("upper").unwrap();
        assert!(Rc::ptr_eq(&a.pipe, &b.pipe));

        let c = registry.get("impureUpper").unwrap();
        let d = registry.get("impureUpper").unwrap();
        assert!(!Rc::ptr_eq(&c.pipe, &d.pipe));
        assert!(!c.pure);
    }

    #[test]
    fn test_transform_and_missing_pipe() {
        let mut registry = PipeRegistry::new();
        registry.register("upper", true, || Upper);
        let pipe = registry.get("upper").unwrap();
        assert_eq!(pipe.transform(&Value::from("ab"), &[]).unwrap(), Value::from("AB"));
        assert!(matches!(
            registry.get("lower"),
            Err(ChangeDetectionError::PipeNotFound(_))
        ));
    }
}
