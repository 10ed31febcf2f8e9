//! # sovran-dyn
//!
//! Runtime-typed values and the containers built on them.
//!
//! `sovran-dyn` provides a small family of single-owner containers for data whose type
//! is only known at runtime. Every stored value carries a [`TypeTag`] naming its
//! primitive kind, and every container owns deep copies of what it is given, so
//! dropping or clearing a container releases everything it holds, nested values
//! included.
//!
//! ## Key Features
//!
//! - **Tagged values**: [`DynVar`] holds any one of seventeen primitive kinds, a string,
//!   an opaque byte blob, a nested `DynVar`, or nothing at all
//! - **Typed arrays**: [`DynArray`] stores elements of one tag contiguously, doubling its
//!   capacity on append and growing exactly on insert
//! - **Heterogeneous lists**: [`DynList`] links independently-typed nodes and doubles as a
//!   stack or a queue
//! - **Explicit failures**: operations that can fail return [`DynError`] and leave the
//!   container as it was; every failure is also reported through `tracing`
//!
//! ## Usage Examples
//!
//! ### Tagged Values
//!
//! ```rust
//! use sovran_dyn::{DynError, DynVar, TypeTag};
//!
//! fn main() -> Result<(), DynError> {
//!     let mut var = DynVar::new();
//!     var.assign_double(2.5);
//!     assert_eq!(var.tag(), Some(TypeTag::Double));
//!     assert_eq!(var.render(" | ")?, "2.5 | ");
//!
//!     // a nested copy survives changes to the original
//!     let nested = DynVar::nested(&var);
//!     var.assign_string("replaced")?;
//!     assert_eq!(nested.to_string(), "2.5");
//!
//!     Ok(())
//! }
//! ```
//!
//! ### Typed Arrays
//!
//! ```rust
//! use sovran_dyn::{DynArray, DynError, DynVar, TypeTag};
//!
//! fn main() -> Result<(), DynError> {
//!     let mut numbers = DynArray::new(5, TypeTag::Int)?;
//!     for n in (0..6).rev() {
//!         numbers.add(&DynVar::Int(n))?;
//!     }
//!     assert_eq!(numbers.capacity(), 10);
//!
//!     numbers.sort_ascending();
//!     assert_eq!(numbers.render(",")?, "0,1,2,3,4,5,");
//!
//!     // elements of the wrong type are refused
//!     match numbers.add(&DynVar::from("six")) {
//!         Err(DynError::TypeMismatch { .. }) => {}
//!         other => panic!("unexpected result: {:?}", other),
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ### Variant Arrays
//!
//! Arrays tagged [`TypeTag::Var`] accept any value and order it with [`DynVar::compare`].
//!
//! ```rust
//! use sovran_dyn::{DynArray, DynError, DynVar, TypeTag};
//!
//! fn main() -> Result<(), DynError> {
//!     let mut words = DynArray::new(0, TypeTag::Var)?;
//!     for word in ["stuff", "crap", "things"] {
//!         words.add(&DynVar::from(word))?;
//!     }
//!
//!     assert_eq!(words.index_of(&DynVar::from("crap")), Some(1));
//!     assert_eq!(words.index_of(&DynVar::from("whoops")), None);
//!
//!     // out-of-range inserts append
//!     words.insert_element(10, &DynVar::from("X"))?;
//!     assert_eq!(words.get(3), Some(DynVar::from("X")));
//!
//!     Ok(())
//! }
//! ```
//!
//! ### Stacks and Queues
//!
//! ```rust
//! use sovran_dyn::{DynError, DynList, DynVar};
//!
//! fn main() -> Result<(), DynError> {
//!     let mut queue = DynList::new();
//!     queue.enqueue(&DynVar::Int(1))?;
//!     queue.enqueue(&DynVar::from("two"))?;
//!     queue.enqueue(&DynVar::Double(3.0))?;
//!
//!     assert_eq!(queue.dequeue(), Some(DynVar::Int(1)));
//!     assert_eq!(queue.dequeue(), Some(DynVar::from("two")));
//!     assert_eq!(queue.count(), 1);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Diagnostics
//!
//! Failures are logged with `tracing::error!` where they are detected, index clamping
//! and lookups that find nothing at `debug`, and buffer growth at `trace`. The crate never
//! installs a subscriber; applications choose where the events go.

mod array;
mod error;
mod format;
mod list;
mod order;
mod tag;
mod value;

pub use array::{ArraySlice, DynArray};
pub use error::DynError;
pub use list::{DynList, Node, NodeIter};
pub use order::ElementComparator;
pub use tag::TypeTag;
pub use value::DynVar;
