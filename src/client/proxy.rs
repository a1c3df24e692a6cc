//! Typed client generation
//!
//! `remote_api!` turns a list of method signatures into a client struct whose async
//! methods encode their arguments in order and forward them through a
//! [`CallRouter`](crate::client::router::CallRouter):
//!
//! ```ignore
//! remote_api! {
//!     pub struct MathApi {
//!         /// Sums two integers on the server.
//!         fn add(a: i64, b: i64) -> i64 = "add";
//!     }
//! }
//!
//! let sum = MathApi::new(router).add(2, 40).await?;
//! ```

use serde::Serialize;
use serde_json::Value;

use crate::errors::RpcError;

pub fn encode_argument<T: Serialize + ?Sized>(value: &T) -> Result<Value, RpcError> {
    serde_json::to_value(value).map_err(|err| RpcError::Encode(err.to_string()))
}

#[macro_export]
macro_rules! remote_api {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$fn_meta:meta])*
                fn $fn_name:ident($($arg:ident: $arg_ty:ty),* $(,)?) -> $ret:ty = $method:expr;
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone)]
        $vis struct $name {
            router: $crate::client::router::CallRouter,
        }

        impl $name {
            pub fn new(router: $crate::client::router::CallRouter) -> Self {
                Self { router }
            }

            pub fn router(&self) -> &$crate::client::router::CallRouter {
                &self.router
            }

            $(
                $(#[$fn_meta])*
                pub async fn $fn_name(
                    &self,
                    $($arg: $arg_ty),*
                ) -> ::std::result::Result<$ret, $crate::errors::RpcError> {
                    let data: ::std::vec::Vec<::serde_json::Value> = ::std::vec![
                        $($crate::client::proxy::encode_argument(&$arg)?),*
                    ];
                    self.router.call::<$ret>($method, data).await
                }
            )*
        }
    };
}
