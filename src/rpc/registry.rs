//! Method registry
//!
//! Maps method names to callables. A registry is assembled once through
//! [`RegistryBuilder`] and is read-only afterwards; cloning shares the same table.
//!
//! Handlers are ordinary functions or closures taking up to six positional
//! parameters. Each parameter is decoded from the matching `data` element, and the
//! return value is serialized back to JSON.
//!
//! ```ignore
//! let registry = RegistryBuilder::new()
//!     .register("add", |a: i64, b: i64| async move { Ok::<_, MethodError>(a + b) })
//!     .register_sync("echo", |text: String| Ok::<_, MethodError>(text))
//!     .build()?;
//! ```

use std::{
    collections::HashMap, fmt, future::Future, marker::PhantomData, panic::AssertUnwindSafe, pin::Pin,
    sync::Arc,
};

use futures::FutureExt;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::errors::RpcError;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Failure reported by a registered method.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct MethodError {
    message: String,
}

impl MethodError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("method names must not be empty")]
    EmptyName,
    #[error("method {0} is registered more than once")]
    DuplicateMethod(String),
}

/// Type-erased callable stored in the registry.
pub trait Method: Send + Sync + 'static {
    fn arity(&self) -> usize;
    fn call(&self, method: &str, args: Vec<Value>) -> BoxFuture<'static, Result<Value, RpcError>>;
}

/// Asynchronous handler taking positional arguments `Args`.
pub trait Handler<Args>: Send + Sync + 'static {
    const ARITY: usize;
    fn invoke(&self, method: &str, args: Vec<Value>) -> BoxFuture<'static, Result<Value, RpcError>>;
}

/// Synchronous handler taking positional arguments `Args`.
pub trait SyncHandler<Args>: Send + Sync + 'static {
    const ARITY: usize;
    fn invoke(&self, method: &str, args: Vec<Value>) -> Result<Value, RpcError>;
}

fn decode_argument<T: DeserializeOwned>(
    method: &str,
    index: usize,
    value: Option<Value>,
) -> Result<T, RpcError> {
    let value = value.ok_or_else(|| RpcError::InvalidArgument {
        method: method.to_string(),
        index,
        message: "missing argument".to_string(),
    })?;

    serde_json::from_value(value).map_err(|err| RpcError::InvalidArgument {
        method: method.to_string(),
        index,
        message: err.to_string(),
    })
}

fn encode_result<R: Serialize>(method: &str, result: Result<R, MethodError>) -> Result<Value, RpcError> {
    let value = result.map_err(|err| RpcError::target_failed(method, err.to_string()))?;
    serde_json::to_value(value)
        .map_err(|err| RpcError::target_failed(method, format!("result is not serializable: {err}")))
}

macro_rules! impl_handler {
    ($arity:expr; $($ty:ident => $index:expr),*) => {
        impl<F, Fut, R, $($ty,)*> Handler<($($ty,)*)> for F
        where
            F: Fn($($ty),*) -> Fut + Send + Sync + 'static,
            Fut: Future<Output = Result<R, MethodError>> + Send + 'static,
            R: Serialize + 'static,
            $($ty: DeserializeOwned + Send + 'static,)*
        {
            const ARITY: usize = $arity;

            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn invoke(&self, method: &str, args: Vec<Value>) -> BoxFuture<'static, Result<Value, RpcError>> {
                let mut args = args.into_iter();
                $(
                    let $ty = match decode_argument::<$ty>(method, $index, args.next()) {
                        Ok(value) => value,
                        Err(err) => return Box::pin(std::future::ready(Err(err))),
                    };
                )*
                let future = (self)($($ty),*);
                let method = method.to_string();
                Box::pin(async move { encode_result(&method, future.await) })
            }
        }

        impl<F, R, $($ty,)*> SyncHandler<($($ty,)*)> for F
        where
            F: Fn($($ty),*) -> Result<R, MethodError> + Send + Sync + 'static,
            R: Serialize,
            $($ty: DeserializeOwned,)*
        {
            const ARITY: usize = $arity;

            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn invoke(&self, method: &str, args: Vec<Value>) -> Result<Value, RpcError> {
                let mut args = args.into_iter();
                $(
                    let $ty = decode_argument::<$ty>(method, $index, args.next())?;
                )*
                encode_result(method, (self)($($ty),*))
            }
        }
    };
}

impl_handler!(0;);
impl_handler!(1; T1 => 0);
impl_handler!(2; T1 => 0, T2 => 1);
impl_handler!(3; T1 => 0, T2 => 1, T3 => 2);
impl_handler!(4; T1 => 0, T2 => 1, T3 => 2, T4 => 3);
impl_handler!(5; T1 => 0, T2 => 1, T3 => 2, T4 => 3, T5 => 4);
impl_handler!(6; T1 => 0, T2 => 1, T3 => 2, T4 => 3, T5 => 4, T6 => 5);

struct AsyncMethod<H, Args> {
    handler: Arc<H>,
    _args: PhantomData<fn() -> Args>,
}

impl<H, Args> Method for AsyncMethod<H, Args>
where
    H: Handler<Args>,
    Args: 'static,
{
    fn arity(&self) -> usize {
        H::ARITY
    }

    fn call(&self, method: &str, args: Vec<Value>) -> BoxFuture<'static, Result<Value, RpcError>> {
        let handler = Arc::clone(&self.handler);
        let method = method.to_string();
        Box::pin(async move { <H as Handler<Args>>::invoke(&*handler, &method, args).await })
    }
}

struct SyncMethod<H, Args> {
    handler: Arc<H>,
    _args: PhantomData<fn() -> Args>,
}

impl<H, Args> Method for SyncMethod<H, Args>
where
    H: SyncHandler<Args>,
    Args: 'static,
{
    fn arity(&self) -> usize {
        H::ARITY
    }

    // The handler body runs when the future is first polled, so a panic is caught
    // by the registry's unwind guard.
    fn call(&self, method: &str, args: Vec<Value>) -> BoxFuture<'static, Result<Value, RpcError>> {
        let handler = Arc::clone(&self.handler);
        let method = method.to_string();
        Box::pin(async move { <H as SyncHandler<Args>>::invoke(&*handler, &method, args) })
    }
}

#[derive(Default)]
pub struct RegistryBuilder {
    methods: Vec<(String, Arc<dyn Method>)>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H, Args>(mut self, name: impl Into<String>, handler: H) -> Self
    where
        H: Handler<Args>,
        Args: 'static,
    {
        let method = AsyncMethod {
            handler: Arc::new(handler),
            _args: PhantomData,
        };
        self.methods.push((name.into(), Arc::new(method)));
        self
    }

    pub fn register_sync<H, Args>(mut self, name: impl Into<String>, handler: H) -> Self
    where
        H: SyncHandler<Args>,
        Args: 'static,
    {
        let method = SyncMethod {
            handler: Arc::new(handler),
            _args: PhantomData,
        };
        self.methods.push((name.into(), Arc::new(method)));
        self
    }

    pub fn build(self) -> Result<Registry, RegistryError> {
        let mut methods = HashMap::with_capacity(self.methods.len());
        for (name, method) in self.methods {
            if name.trim().is_empty() {
                return Err(RegistryError::EmptyName);
            }
            if methods.contains_key(&name) {
                return Err(RegistryError::DuplicateMethod(name));
            }
            methods.insert(name, method);
        }

        Ok(Registry {
            methods: Arc::new(methods),
        })
    }
}

#[derive(Clone, Default)]
pub struct Registry {
    methods: Arc<HashMap<String, Arc<dyn Method>>>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("methods", &self.names())
            .finish()
    }
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Method>> {
        self.methods.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Looks up `name`, checks the argument count and runs the method to completion.
    ///
    /// A panicking handler surfaces as [`RpcError::TargetFailed`] instead of unwinding
    /// into the caller. No particular executor is required.
    pub async fn invoke(&self, name: &str, data: Vec<Value>) -> Result<Value, RpcError> {
        let method = self.get(name).ok_or_else(|| RpcError::not_found(name))?;

        if data.len() != method.arity() {
            return Err(RpcError::ArityMismatch {
                method: name.to_string(),
                expected: method.arity(),
                actual: data.len(),
            });
        }

        AssertUnwindSafe(method.call(name, data))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| Err(RpcError::target_failed(name, "method panicked")))
    }
}
