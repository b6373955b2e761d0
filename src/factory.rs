//! Handler factory: from a resolved identity to a live handler.
//!
//! There is no reflection to lean on, so every constructible identity is
//! registered up front. The registry doubles as the allow-list of what a
//! router may ever instantiate.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::handler::{handler, BoxedHandler, Handler};
use crate::router::HandlerIdentity;

/// Constructor arguments handed to every registered constructor.
///
/// Positional and dynamically typed, read back with [`Arguments::get`].
///
/// ```rust
/// use warpcore::Arguments;
///
/// let args = Arguments::new().with(42_u32).with("greeting".to_owned());
/// assert_eq!(args.get::<u32>(0), Some(&42));
/// assert_eq!(args.get::<String>(1).map(String::as_str), Some("greeting"));
/// assert_eq!(args.get::<u32>(1), None);
/// ```
#[derive(Clone, Default)]
pub struct Arguments {
    values: Vec<Arc<dyn Any + Send + Sync>>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.values.push(Arc::new(value));
        self
    }

    /// The argument at `index`, if there is one and it has type `T`.
    pub fn get<T: Any>(&self, index: usize) -> Option<&T> {
        self.values.get(index)?.downcast_ref()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arguments").field("len", &self.values.len()).finish()
    }
}

type Constructor = Box<dyn Fn(&Arguments) -> Result<Box<dyn Any + Send>> + Send + Sync>;

/// Builds handlers from identities.
///
/// ```rust
/// use warpcore::{Arguments, Handler, HandlerFactory, Request, Response, Verb};
///
/// let mut factory = HandlerFactory::new();
/// factory.register("app::Hello", |args: &Arguments| {
///     let name = args.get::<String>(0).cloned().unwrap_or_default();
///     Ok(move |_req: &mut Request| Response::text(format!("Hello, {name}!")))
/// });
/// factory.with_arguments(Arguments::new().with("World".to_owned()));
///
/// let hello = factory.make(&"app::Hello".into()).unwrap();
/// let res = hello.dispatch(&mut Request::new(Verb::Get, "/")).unwrap().unwrap();
/// assert_eq!(res.body(), b"Hello, World!");
/// ```
#[derive(Default)]
pub struct HandlerFactory {
    constructors: HashMap<HandlerIdentity, Constructor>,
    arguments: Arguments,
}

impl HandlerFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler constructor under `identity`.
    pub fn register<H, F>(&mut self, identity: impl Into<HandlerIdentity>, constructor: F) -> &mut Self
    where
        H: Handler,
        F: Fn(&Arguments) -> Result<H> + Send + Sync + 'static,
    {
        self.constructors.insert(
            identity.into(),
            Box::new(move |args: &Arguments| {
                let product: Box<dyn Any + Send> = Box::new(handler(constructor(args)?));
                Ok(product)
            }),
        );
        self
    }

    /// Register a constructor for an arbitrary type.
    ///
    /// `make` fails with [`Error::NotAHandler`] for these identities: they
    /// construct, but cannot dispatch.
    pub fn register_any<T, F>(&mut self, identity: impl Into<HandlerIdentity>, constructor: F) -> &mut Self
    where
        T: Any + Send,
        F: Fn(&Arguments) -> Result<T> + Send + Sync + 'static,
    {
        self.constructors.insert(
            identity.into(),
            Box::new(move |args: &Arguments| {
                let product: Box<dyn Any + Send> = Box::new(constructor(args)?);
                Ok(product)
            }),
        );
        self
    }

    /// Arguments for every subsequent `make`, until reset.
    pub fn with_arguments(&mut self, arguments: Arguments) -> &mut Self {
        self.arguments = arguments;
        self
    }

    pub fn reset_arguments(&mut self) -> &mut Self {
        self.arguments = Arguments::new();
        self
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.constructors.contains_key(identity)
    }

    /// Construct the handler registered under `identity`.
    ///
    /// Errors returned by the constructor itself propagate unchanged.
    pub fn make(&self, identity: &HandlerIdentity) -> Result<BoxedHandler> {
        let constructor = self
            .constructors
            .get(identity)
            .ok_or_else(|| Error::HandlerNotFound(identity.clone()))?;

        constructor(&self.arguments)?
            .downcast::<BoxedHandler>()
            .map(|h| *h)
            .map_err(|_| Error::NotAHandler(identity.clone()))
    }
}

impl fmt::Debug for HandlerFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerFactory")
            .field("registered", &self.constructors.len())
            .field("arguments", &self.arguments)
            .finish()
    }
}
