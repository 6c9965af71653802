//! Dynamically typed values.

use core::fmt;
use std::collections::HashMap;

/// A value in the data pool or in a markup attribute bag.
///
/// Conversions never fail: a value that can’t be interpreted as the requested type yields that
/// type’s zero value.
#[derive(Debug, Clone, PartialEq)]
pub enum Var {
    String(String),
    Number(f64),
    Bool(bool),
}

/// Data pool passed to a screen: key → value.
pub type DataMap = HashMap<String, Var>;

impl Var {
    /// Returns the value as a string.
    pub fn as_string(&self) -> String {
        match self {
            Var::String(s) => s.clone(),
            Var::Number(n) => n.to_string(),
            Var::Bool(b) => b.to_string(),
        }
    }

    /// Returns the value as a number.
    pub fn as_f64(&self) -> f64 {
        match self {
            Var::String(s) => s.trim().parse().unwrap_or(0.),
            Var::Number(n) => *n,
            Var::Bool(true) => 1.,
            Var::Bool(false) => 0.,
        }
    }

    /// Returns the value as a boolean.
    ///
    /// Strings are truthy if they read `true` or `1`.
    pub fn as_bool(&self) -> bool {
        match self {
            Var::String(s) => {
                let s = s.trim();
                s.eq_ignore_ascii_case("true") || s == "1"
            }
            Var::Number(n) => *n != 0.,
            Var::Bool(b) => *b,
        }
    }
}

impl Default for Var {
    fn default() -> Var {
        Var::String(String::new())
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

impl From<String> for Var {
    fn from(s: String) -> Var {
        Var::String(s)
    }
}

impl From<&str> for Var {
    fn from(s: &str) -> Var {
        Var::String(s.to_string())
    }
}

impl From<f64> for Var {
    fn from(n: f64) -> Var {
        Var::Number(n)
    }
}

impl From<i32> for Var {
    fn from(n: i32) -> Var {
        Var::Number(n.into())
    }
}

impl From<bool> for Var {
    fn from(b: bool) -> Var {
        Var::Bool(b)
    }
}

#[test]
fn test_var_conversions() {
    assert_eq!(Var::from(3).as_string(), "3");
    assert_eq!(Var::from(2.5).as_string(), "2.5");
    assert_eq!(Var::from(1e20).as_string(), "100000000000000000000");
    assert_eq!(Var::from(-7.).as_string(), "-7");
    assert_eq!(Var::from("  12 ").as_f64(), 12.);
    assert_eq!(Var::from("twelve").as_f64(), 0.);
    assert!(Var::from("TRUE").as_bool());
    assert!(Var::from("1").as_bool());
    assert!(!Var::from("yes").as_bool());
    assert!(Var::from(true).as_f64() == 1.);
    assert_eq!(Var::default().as_string(), "");
}
