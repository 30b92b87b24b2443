//! Capability Table
//!
//! Versioned registry of the operators and functions the remote dialect
//! accepts, and how each one is rewritten. Versions are the remote engine's
//! integer form, e.g. `20500` for 2.5.

use std::collections::HashMap;
use std::sync::OnceLock;

/// First remote version with a native BOOLEAN type.
pub const BOOLEAN_MIN_VERSION: i32 = 30000;

/// Largest IN list the remote engine accepts.
pub const MAX_IN_LIST_ELEMENTS: usize = 1500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    Unary,
    Binary,
}

/// How an operator application is written remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorRule {
    /// `(left OP right)`
    Infix(&'static str),
    /// `(OPoperand)`
    Prefix(&'static str),
    /// `(NAME(left, right))`
    Function(&'static str),
    /// `(LOWER(left) [NOT] LIKE LOWER(right))`
    CaseInsensitiveLike { negated: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorEntry {
    pub name: &'static str,
    pub arity: Arity,
    pub min_version: i32,
    pub rule: OperatorRule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimSide {
    Leading,
    Trailing,
}

impl TrimSide {
    pub fn keyword(&self) -> &'static str {
        match self {
            TrimSide::Leading => "LEADING",
            TrimSide::Trailing => "TRAILING",
        }
    }
}

/// How a function call is written remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionRule {
    /// `NAME(args)` with the local name upper-cased
    PassThrough,
    Rename(&'static str),
    /// One name for a single argument, another otherwise
    RenameByArity {
        unary: &'static str,
        otherwise: &'static str,
    },
    /// `(a || b || ...)`
    Concat,
    /// `POSITION(substring IN string)`; the local order is `(string, substring)`
    Position,
    /// `SUBSTRING(s FROM start [FOR count])`
    Substring,
    /// `TRIM(side [chars] FROM s)`
    Trim(TrimSide),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgShape {
    Any,
    AtLeast(usize),
    Range(usize, usize),
}

impl ArgShape {
    pub fn accepts(&self, n: usize) -> bool {
        match *self {
            ArgShape::Any => true,
            ArgShape::AtLeast(min) => n >= min,
            ArgShape::Range(min, max) => (min..=max).contains(&n),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionEntry {
    pub name: &'static str,
    pub min_version: i32,
    pub args: ArgShape,
    /// Argument positions that must be integer literals when present
    pub integer_literal_args: &'static [usize],
    pub rule: FunctionRule,
}

/// Registry of pushdown-capable operators and functions.
#[derive(Debug, Clone, Default)]
pub struct CapabilityTable {
    operators: HashMap<Arity, HashMap<&'static str, OperatorEntry>>,
    functions: HashMap<&'static str, FunctionEntry>,
}

impl CapabilityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The table for the remote dialect, built once.
    pub fn standard() -> &'static CapabilityTable {
        static TABLE: OnceLock<CapabilityTable> = OnceLock::new();
        TABLE.get_or_init(Self::build_standard)
    }

    pub fn operator(
        mut self,
        name: &'static str,
        arity: Arity,
        min_version: i32,
        rule: OperatorRule,
    ) -> Self {
        self.operators.entry(arity).or_default().insert(
            name,
            OperatorEntry {
                name,
                arity,
                min_version,
                rule,
            },
        );
        self
    }

    pub fn function(mut self, name: &'static str, min_version: i32, rule: FunctionRule) -> Self {
        self.functions.insert(
            name,
            FunctionEntry {
                name,
                min_version,
                args: ArgShape::Any,
                integer_literal_args: &[],
                rule,
            },
        );
        self
    }

    /// Like [`function`](Self::function) with an argument-count and literal restriction.
    pub fn function_with_args(
        mut self,
        name: &'static str,
        min_version: i32,
        args: ArgShape,
        integer_literal_args: &'static [usize],
        rule: FunctionRule,
    ) -> Self {
        self.functions.insert(
            name,
            FunctionEntry {
                name,
                min_version,
                args,
                integer_literal_args,
                rule,
            },
        );
        self
    }

    /// Operator entry usable at `version`.
    pub fn lookup_operator(&self, name: &str, arity: Arity, version: i32) -> Option<&OperatorEntry> {
        self.operators
            .get(&arity)?
            .get(name)
            .filter(|entry| version >= entry.min_version)
    }

    /// Function entry usable at `version`. Names are matched case-insensitively.
    pub fn lookup_function(&self, name: &str, version: i32) -> Option<&FunctionEntry> {
        self.functions
            .get(name.to_ascii_lowercase().as_str())
            .filter(|entry| version >= entry.min_version)
    }

    fn build_standard() -> CapabilityTable {
        use Arity::{Binary, Unary};
        use FunctionRule::*;

        let table = CapabilityTable::new()
            .operator("=", Binary, 0, OperatorRule::Infix("="))
            .operator("<>", Binary, 0, OperatorRule::Infix("<>"))
            .operator(">", Binary, 0, OperatorRule::Infix(">"))
            .operator("<", Binary, 0, OperatorRule::Infix("<"))
            .operator(">=", Binary, 0, OperatorRule::Infix(">="))
            .operator("<=", Binary, 0, OperatorRule::Infix("<="))
            .operator("~~", Binary, 0, OperatorRule::Infix("LIKE"))
            .operator("!~~", Binary, 0, OperatorRule::Infix("NOT LIKE"))
            .operator(
                "~~*",
                Binary,
                0,
                OperatorRule::CaseInsensitiveLike { negated: false },
            )
            .operator(
                "!~~*",
                Binary,
                0,
                OperatorRule::CaseInsensitiveLike { negated: true },
            )
            .operator("<<", Binary, 20100, OperatorRule::Function("BIN_SHL"))
            .operator(">>", Binary, 20100, OperatorRule::Function("BIN_SHR"))
            .operator("-", Unary, 0, OperatorRule::Prefix("-"));

        // 1.5
        let table = table
            .function_with_args("concat", 10500, ArgShape::AtLeast(1), &[], Concat)
            .function_with_args("coalesce", 10500, ArgShape::AtLeast(2), &[], PassThrough);

        // 2.0
        let table = [
            "bit_length",
            "char_length",
            "character_length",
            "lower",
            "octet_length",
            "upper",
        ]
        .into_iter()
        .fold(table, |t, name| t.function(name, 20000, PassThrough))
        .function_with_args("substring", 20000, ArgShape::Range(2, 3), &[1, 2], Substring);

        // 2.1
        let table = [
            "abs", "acos", "asin", "atan", "atan2", "ceil", "ceiling", "cos", "cot", "exp",
            "floor", "mod", "nullif", "overlay", "power", "reverse", "sign", "sin", "sqrt", "tan",
            "trunc",
        ]
        .into_iter()
        .fold(table, |t, name| t.function(name, 20100, PassThrough))
        .function("length", 20100, Rename("CHAR_LENGTH"))
        .function("pow", 20100, Rename("POWER"))
        .function_with_args(
            "log",
            20100,
            ArgShape::Range(1, 2),
            &[],
            RenameByArity {
                unary: "LOG10",
                otherwise: "LOG",
            },
        )
        .function_with_args("position", 20100, ArgShape::Range(2, 2), &[], Position)
        .function_with_args("strpos", 20100, ArgShape::Range(2, 2), &[], Position)
        .function_with_args(
            "ltrim",
            20100,
            ArgShape::Range(1, 2),
            &[],
            Trim(TrimSide::Leading),
        )
        .function_with_args(
            "rtrim",
            20100,
            ArgShape::Range(1, 2),
            &[],
            Trim(TrimSide::Trailing),
        );

        // 2.5
        table
            .function("lpad", 20500, PassThrough)
            .function("rpad", 20500, PassThrough)
    }
}
