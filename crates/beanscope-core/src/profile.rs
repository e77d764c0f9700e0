use std::collections::BTreeSet;
use std::fmt;

use smol_str::SmolStr;

use crate::DEFAULT_PROFILE;

/// The set of profiles a model is evaluated against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActiveProfileSet(BTreeSet<SmolStr>);

impl ActiveProfileSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, profile: impl Into<SmolStr>) -> bool {
        let profile = profile.into();
        if profile.trim().is_empty() {
            return false;
        }
        self.0.insert(profile)
    }

    pub fn contains(&self, profile: &str) -> bool {
        self.0.contains(profile)
    }

    /// Whether `profile` is active. The `default` profile is active exactly
    /// when nothing else is.
    pub fn is_active(&self, profile: &str) -> bool {
        if self.0.is_empty() {
            return profile == DEFAULT_PROFILE;
        }
        self.0.contains(profile)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(SmolStr::as_str)
    }
}

impl<S: Into<SmolStr>> FromIterator<S> for ActiveProfileSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        let mut set = Self::new();
        for profile in iter {
            set.insert(profile);
        }
        set
    }
}

impl fmt::Display for ActiveProfileSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (idx, profile) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str(",")?;
            }
            f.write_str(profile)?;
        }
        f.write_str("}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProfileExpressionError {
    #[error("profile expression is empty")]
    Empty,
    #[error("malformed profile expression `{0}`")]
    Malformed(String),
}

/// A parsed profile expression (`dev`, `!prod`, `cloud & (eu | us)`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProfileExpr {
    Name(SmolStr),
    Not(Box<ProfileExpr>),
    And(Vec<ProfileExpr>),
    Or(Vec<ProfileExpr>),
}

impl ProfileExpr {
    pub fn parse(input: &str) -> Result<Self, ProfileExpressionError> {
        if input.trim().is_empty() {
            return Err(ProfileExpressionError::Empty);
        }
        let tokens = tokenize(input);
        let mut parser = Parser {
            input,
            tokens: &tokens,
            pos: 0,
        };
        let expr = parser.sequence(false)?;
        if parser.pos != tokens.len() {
            return Err(parser.malformed());
        }
        Ok(expr)
    }

    pub fn evaluate(&self, active: &ActiveProfileSet) -> bool {
        match self {
            ProfileExpr::Name(name) => active.is_active(name),
            ProfileExpr::Not(inner) => !inner.evaluate(active),
            ProfileExpr::And(all) => all.iter().all(|e| e.evaluate(active)),
            ProfileExpr::Or(any) => any.iter().any(|e| e.evaluate(active)),
        }
    }

    fn collect_names<'a>(&'a self, out: &mut BTreeSet<&'a str>) {
        match self {
            ProfileExpr::Name(name) => {
                out.insert(name.as_str());
            }
            ProfileExpr::Not(inner) => inner.collect_names(out),
            ProfileExpr::And(items) | ProfileExpr::Or(items) => {
                for item in items {
                    item.collect_names(out);
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token<'a> {
    Open,
    Close,
    And,
    Or,
    Not,
    Name(&'a str),
}

fn tokenize(input: &str) -> Vec<Token<'_>> {
    fn flush<'a>(out: &mut Vec<Token<'a>>, text: &'a str) {
        let text = text.trim();
        if !text.is_empty() {
            out.push(Token::Name(text));
        }
    }

    let mut out = Vec::new();
    let mut start = 0usize;
    for (idx, ch) in input.char_indices() {
        let token = match ch {
            '(' => Token::Open,
            ')' => Token::Close,
            '&' => Token::And,
            '|' => Token::Or,
            '!' => Token::Not,
            _ => continue,
        };
        flush(&mut out, &input[start..idx]);
        out.push(token);
        start = idx + ch.len_utf8();
    }
    flush(&mut out, &input[start..]);
    out
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Operator {
    And,
    Or,
}

struct Parser<'t, 'a> {
    input: &'a str,
    tokens: &'t [Token<'a>],
    pos: usize,
}

impl<'t, 'a> Parser<'t, 'a> {
    fn malformed(&self) -> ProfileExpressionError {
        ProfileExpressionError::Malformed(self.input.to_string())
    }

    fn next(&mut self) -> Option<&'t Token<'a>> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    /// Parses operands joined by a single operator kind. Mixing `&` and `|`
    /// without parentheses is rejected.
    fn sequence(&mut self, in_bracket: bool) -> Result<ProfileExpr, ProfileExpressionError> {
        let mut elements = Vec::new();
        let mut operator: Option<Operator> = None;
        let mut expect_operand = true;

        loop {
            let Some(token) = self.next() else {
                if in_bracket {
                    return Err(self.malformed());
                }
                break;
            };
            match token {
                Token::Close if in_bracket => break,
                Token::Close => return Err(self.malformed()),
                Token::And | Token::Or => {
                    let op = if *token == Token::And {
                        Operator::And
                    } else {
                        Operator::Or
                    };
                    if expect_operand || operator.is_some_and(|prev| prev != op) {
                        return Err(self.malformed());
                    }
                    operator = Some(op);
                    expect_operand = true;
                }
                Token::Open | Token::Not | Token::Name(_) => {
                    if !expect_operand {
                        return Err(self.malformed());
                    }
                    self.pos -= 1;
                    elements.push(self.unary()?);
                    expect_operand = false;
                }
            }
        }

        if expect_operand || elements.is_empty() {
            return Err(self.malformed());
        }
        if elements.len() == 1 {
            return Ok(elements.remove(0));
        }
        Ok(match operator {
            Some(Operator::And) => ProfileExpr::And(elements),
            _ => ProfileExpr::Or(elements),
        })
    }

    fn unary(&mut self) -> Result<ProfileExpr, ProfileExpressionError> {
        match self.next() {
            Some(Token::Name(name)) => Ok(ProfileExpr::Name(SmolStr::new(name))),
            Some(Token::Open) => self.sequence(true),
            Some(Token::Not) => Ok(ProfileExpr::Not(Box::new(self.unary()?))),
            _ => Err(self.malformed()),
        }
    }
}

/// Profile gate attached to a unit or a single definition.
///
/// An empty condition is unconditional. A non-empty condition matches when
/// any of its expressions matches (Spring's `@Profile({"a", "b"})` semantics).
/// A condition whose every expression failed to parse never matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ProfileCondition {
    expressions: Vec<ProfileExpr>,
    malformed: bool,
}

impl ProfileCondition {
    pub fn unconditional() -> Self {
        Self::default()
    }

    /// Parses every expression, keeping the well-formed ones and returning
    /// each rejected expression with its error.
    ///
    /// A lone `default` expression is unconditional.
    pub fn parse<I, S>(expressions: I) -> (Self, Vec<(String, ProfileExpressionError)>)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let inputs: Vec<S> = expressions.into_iter().collect();
        if let [only] = inputs.as_slice() {
            if only.as_ref().trim() == DEFAULT_PROFILE {
                return (Self::unconditional(), Vec::new());
            }
        }

        let mut parsed = Vec::new();
        let mut errors = Vec::new();
        for expression in &inputs {
            let expression = expression.as_ref();
            match ProfileExpr::parse(expression) {
                Ok(expr) => {
                    if !parsed.contains(&expr) {
                        parsed.push(expr);
                    }
                }
                Err(err) => errors.push((expression.to_string(), err)),
            }
        }
        let malformed = parsed.is_empty() && !errors.is_empty();
        (
            Self {
                expressions: parsed,
                malformed,
            },
            errors,
        )
    }

    /// Convenience for well-formed input; malformed expressions are dropped.
    pub fn of<I, S>(expressions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::parse(expressions).0
    }

    pub fn is_unconditional(&self) -> bool {
        self.expressions.is_empty() && !self.malformed
    }

    /// Whether every expression of the condition was rejected.
    pub fn is_malformed(&self) -> bool {
        self.malformed
    }

    pub fn matches(&self, active: &ActiveProfileSet) -> bool {
        if self.malformed {
            return false;
        }
        self.expressions.is_empty() || self.expressions.iter().any(|e| e.evaluate(active))
    }

    pub fn expressions(&self) -> &[ProfileExpr] {
        &self.expressions
    }

    /// Every profile name mentioned by the condition, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut out = BTreeSet::new();
        for expr in &self.expressions {
            expr.collect_names(&mut out);
        }
        out.into_iter().collect()
    }
}
