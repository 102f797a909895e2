//! # Factory Module
//!
//! Builds objects and return values from anything that can be called.
//!
//! ## Overview
//!
//! A factory is given as a [`FactorySpec`], the "pseudo-callable" surface form:
//!
//! - `"make_clock"`: a registered free function
//! - `"Item::show"` / `"Item::show()"`: a method reference (`Item::new` is the
//!   constructor)
//! - `(TypeName, method)`: an explicit type + method pair
//! - `(Object, method)`: an already constructed instance + method
//! - a bare [`Callable`](crate::reflect::Callable) passed directly
//!
//! [`InvocableDescriptor::normalize`] turns every surface form into one
//! canonical [`InvocableDescriptor`] against the
//! [`TypeRegistry`](crate::reflect::TypeRegistry). [`FactoryInvoker`] then
//! resolves the descriptor's arguments through the
//! [`ArgumentResolver`](crate::resolver::ArgumentResolver) and calls it:
//!
//! ```text
//! FactorySpec ──normalize──▶ InvocableDescriptor ──invoke──▶ Value
//!                                   │
//!                  UnboundMethod ───┴──▶ create_object(owner)
//!                                          │
//!                      Manufacturable? ────┼── yes ─▶ invoke(owner's factory)
//!                                          └── no ──▶ invoke(owner::new)
//! ```
//!
//! ## Errors
//!
//! - unknown function, type, method or constructor: `InvalidFactorySpec`
//! - a parameter nobody can supply: `UnresolvedArgument`
//! - errors raised by the invoked body pass through untouched

mod descriptor;
mod invoker;

pub use descriptor::{FactorySpec, InvocableDescriptor};
pub use invoker::FactoryInvoker;
