//! Prefix forwardings of phone numbers.
//!
//! [`PhoneForward`] keeps a mutable set of forwardings between phone
//! numbers, which are non-empty strings over the twelve digits `0`-`9`,
//! `*` and `#`. A forwarding `A → B` rewrites any number starting with `A`
//! by replacing that prefix with `B`; when several forwarded prefixes
//! apply, the longest one wins. The index also answers the reverse
//! question: which numbers would forward onto a given one.
//!
//! ```
//! use phonefwd::PhoneForward;
//!
//! let mut pf = PhoneForward::new();
//! pf.add("123", "9").unwrap();
//! pf.add("12345", "687").unwrap();
//!
//! // the longest forwarded prefix wins
//! assert_eq!(pf.get("1234567").get(0), Some("68767"));
//!
//! // everything that could forward onto a number, the number included
//! let sources: Vec<_> = pf.reverse("9").iter().map(String::from).collect();
//! assert_eq!(sources, ["123", "9"]);
//! ```
//!
//! Forward lookup costs O(|num|); reverse enumeration costs O(|num| · k)
//! where k is the number of sources forwarded onto the visited prefixes.
//! Both trees live in index arenas, so numbers tens of thousands of digits
//! long neither recurse nor blow the stack on drop.

mod digits;
mod forward;
mod list;
mod numbers;
mod trie;

pub use digits::{cmp_numbers, is_digit, is_valid_number};
pub use forward::{Error, PhoneForward};
pub use numbers::PhoneNumbers;
