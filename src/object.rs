//! This module provides [`FinchObject`].

use crate::callable::{function::FinchFunction, FinchCallable};
use ordered_float::OrderedFloat;
use std::{cell::RefCell, collections::HashMap, rc::Rc};

/// Possible objects in Finch.
///
/// Arrays and dictionaries are reference values: cloning the object clones a cheap handle to
/// shared storage, so mutation through one alias is visible through all of them.
#[derive(Clone, Debug)]
#[allow(clippy::missing_docs_in_private_items)]
pub enum FinchObject {
    Nil,
    Boolean(bool),
    Number(f64),
    String(String),
    Array(Rc<RefCell<Vec<FinchObject>>>),
    Dictionary(Rc<RefCell<HashMap<DictKey, FinchObject>>>),
    NativeFunction(Rc<dyn FinchCallable>),
    Function(Rc<FinchFunction>),
}

impl PartialEq for FinchObject {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Nil, Self::Nil) => true,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => Rc::ptr_eq(a, b),
            (Self::Dictionary(a), Self::Dictionary(b)) => Rc::ptr_eq(a, b),
            (Self::NativeFunction(a), Self::NativeFunction(b)) => a.name() == b.name(),
            (Self::Function(a), Self::Function(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl FinchObject {
    /// Create a new array from the given elements.
    pub fn new_array(elements: Vec<FinchObject>) -> Self {
        Self::Array(Rc::new(RefCell::new(elements)))
    }

    /// Create a new dictionary from the given entries.
    pub fn new_dictionary(entries: HashMap<DictKey, FinchObject>) -> Self {
        Self::Dictionary(Rc::new(RefCell::new(entries)))
    }

    /// Get the name of the type of this object.
    pub fn type_name(&self) -> &'static str {
        use FinchObject::*;

        match self {
            Nil => "nil",
            Boolean(_) => "boolean",
            Number(_) => "number",
            String(_) => "string",
            Array(_) => "array",
            Dictionary(_) => "dictionary",
            NativeFunction(_) | Function(_) => "function",
        }
    }

    /// Return the representation of the object to display when printing.
    pub fn print(&self) -> String {
        use FinchObject::*;

        match self {
            Nil => "nil".to_string(),
            Boolean(b) => b.to_string(),
            Number(n) => n.to_string(),
            String(s) => s.to_string(),
            Array(elements) => format!(
                "[{}]",
                elements
                    .borrow()
                    .iter()
                    .map(Self::repr)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Dictionary(entries) => format!(
                "{{{}}}",
                entries
                    .borrow()
                    .iter()
                    .map(|(key, value)| format!("{}: {}", key.repr(), value.repr()))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            NativeFunction(func) => format!("<native fn {}>", func.name()),
            Function(func) => match func.name() {
                Some(name) => format!("<fn {name}>"),
                None => "<lambda>".to_string(),
            },
        }
    }

    /// Return the representation of the object to display inside aggregates, with strings quoted.
    pub fn repr(&self) -> String {
        match self {
            Self::String(s) => format!("{s:?}"),
            _ => self.print(),
        }
    }

    /// Is this object truthy?
    ///
    /// Only nil and false are falsy. Everything else, including 0, "", and [], is truthy.
    pub fn is_truthy(&self) -> bool {
        #[allow(clippy::match_like_matches_macro, reason = "This is much clearer")]
        match self {
            Self::Nil | Self::Boolean(false) => false,
            _ => true,
        }
    }

    /// Convert this object to a dictionary key, if it is a hashable type.
    ///
    /// Arrays, dictionaries, and functions cannot be keys.
    pub fn as_dict_key(&self) -> Option<DictKey> {
        match self {
            Self::Nil => Some(DictKey::Nil),
            Self::Boolean(b) => Some(DictKey::Boolean(*b)),
            Self::Number(n) => Some(DictKey::Number(OrderedFloat(*n))),
            Self::String(s) => Some(DictKey::String(s.clone())),
            _ => None,
        }
    }
}

/// A dictionary key.
///
/// Key equality follows the language's `==` on numbers ([`OrderedFloat`] also makes NaN equal to
/// itself and `-0.0` equal to `0.0`, matching hash-map key behaviour in most languages), content
/// equality on strings, and identity on booleans and nil.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[allow(clippy::missing_docs_in_private_items)]
pub enum DictKey {
    Nil,
    Boolean(bool),
    Number(OrderedFloat<f64>),
    String(String),
}

impl DictKey {
    /// Return the representation of the key to display when printing a dictionary.
    pub fn repr(&self) -> String {
        match self {
            Self::Nil => "nil".to_string(),
            Self::Boolean(b) => b.to_string(),
            Self::Number(n) => n.into_inner().to_string(),
            Self::String(s) => format!("{s:?}"),
        }
    }
}
