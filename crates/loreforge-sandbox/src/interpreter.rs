//! Tree-walking evaluator. One `Evaluation` is built per execution and
//! dropped afterwards.

use std::collections::HashMap;

use loreforge_core::cancel::CancellationToken;
use loreforge_core::rng::DeterministicRng;

use crate::capabilities::{self, Builtin, DiceLimits, Namespace};
use crate::error::{SandboxError, ScriptFault};
use crate::parser::{BinaryOp, Expr, LogicalOp, Stmt, UnaryOp};
use crate::record::ScriptVariables;
use crate::value::ScriptValue;

const CANCEL_CHECK_INTERVAL: u64 = 64;

#[derive(Debug, Clone)]
enum Value {
    Data(ScriptValue),
    Namespace(Namespace),
    Builtin(Builtin),
}

impl Value {
    fn into_data(self, context: &str) -> Result<ScriptValue, ScriptFault> {
        match self {
            Self::Data(value) => Ok(value),
            Self::Namespace(_) | Self::Builtin(_) => Err(ScriptFault::Runtime(format!(
                "{context}: capabilities cannot be used as values"
            ))),
        }
    }
}

#[derive(Debug)]
struct Local {
    value: Value,
    constant: bool,
}

enum Flow {
    Normal(Option<Value>),
    Return(Value),
}

pub(crate) struct Evaluation<'a> {
    variables: &'a ScriptVariables,
    rng: &'a mut dyn DeterministicRng,
    cancellation: &'a CancellationToken,
    dice: DiceLimits,
    max_steps: u64,
    max_text_bytes: usize,
    steps: u64,
    scopes: Vec<HashMap<String, Local>>,
}

impl<'a> Evaluation<'a> {
    pub(crate) fn new(
        variables: &'a ScriptVariables,
        rng: &'a mut dyn DeterministicRng,
        cancellation: &'a CancellationToken,
        dice: DiceLimits,
        max_steps: u64,
        max_text_bytes: usize,
    ) -> Self {
        Self {
            variables,
            rng,
            cancellation,
            dice,
            max_steps,
            max_text_bytes,
            steps: 0,
            scopes: vec![HashMap::new()],
        }
    }

    /// Runs a program and returns its completion value: the argument of the
    /// first `return`, or else the value of the last expression statement.
    pub(crate) fn run(mut self, program: &[Stmt]) -> Result<ScriptValue, SandboxError> {
        let value = match self.block(program)? {
            Flow::Return(value) | Flow::Normal(Some(value)) => value,
            Flow::Normal(None) => Value::Data(ScriptValue::Null),
        };
        Ok(match value {
            Value::Data(data) => data,
            Value::Namespace(_) | Value::Builtin(_) => ScriptValue::Null,
        })
    }

    fn tick(&mut self) -> Result<(), SandboxError> {
        self.steps += 1;
        if self.steps > self.max_steps {
            return Err(ScriptFault::LimitExceeded(format!(
                "more than {} evaluation steps",
                self.max_steps
            ))
            .into());
        }
        if self.steps % CANCEL_CHECK_INTERVAL == 0 && self.cancellation.is_cancelled() {
            return Err(SandboxError::Cancelled);
        }
        Ok(())
    }

    fn block(&mut self, statements: &[Stmt]) -> Result<Flow, SandboxError> {
        let mut completion = None;
        for statement in statements {
            match self.statement(statement)? {
                Flow::Return(value) => return Ok(Flow::Return(value)),
                Flow::Normal(Some(value)) => completion = Some(value),
                Flow::Normal(None) => {}
            }
        }
        Ok(Flow::Normal(completion))
    }

    fn scoped_block(&mut self, statements: &[Stmt]) -> Result<Flow, SandboxError> {
        self.scopes.push(HashMap::new());
        let flow = self.block(statements);
        self.scopes.pop();
        flow
    }

    fn statement(&mut self, statement: &Stmt) -> Result<Flow, SandboxError> {
        self.tick()?;
        match statement {
            Stmt::Declare {
                name,
                value,
                constant,
            } => {
                if self.is_read_only(name) {
                    return Err(ScriptFault::Runtime(format!(
                        "`{name}` is a read-only binding and cannot be redeclared"
                    ))
                    .into());
                }
                let value = self.expression(value)?;
                let scope = self
                    .scopes
                    .last_mut()
                    .ok_or_else(|| ScriptFault::Runtime("no active scope".to_owned()))?;
                if scope.contains_key(name) {
                    return Err(
                        ScriptFault::Runtime(format!("`{name}` is already declared")).into(),
                    );
                }
                scope.insert(
                    name.clone(),
                    Local {
                        value,
                        constant: *constant,
                    },
                );
                Ok(Flow::Normal(None))
            }
            Stmt::Assign { name, value } => {
                let value = self.expression(value)?;
                let read_only = self.is_read_only(name);
                let local = self
                    .scopes
                    .iter_mut()
                    .rev()
                    .find_map(|scope| scope.get_mut(name));
                match local {
                    Some(local) if local.constant => Err(ScriptFault::Runtime(format!(
                        "cannot assign to constant `{name}`"
                    ))
                    .into()),
                    Some(local) => {
                        local.value = value;
                        Ok(Flow::Normal(None))
                    }
                    None if read_only => Err(ScriptFault::Runtime(format!(
                        "`{name}` is read-only"
                    ))
                    .into()),
                    None => Err(
                        ScriptFault::Runtime(format!("`{name}` is not declared")).into(),
                    ),
                }
            }
            Stmt::If {
                condition,
                then,
                otherwise,
            } => {
                let condition = self.expression(condition)?.into_data("if condition")?;
                if condition.is_truthy() {
                    self.scoped_block(then)
                } else {
                    self.scoped_block(otherwise)
                }
            }
            Stmt::Return(value) => Ok(Flow::Return(self.expression(value)?)),
            Stmt::Expr(expr) => Ok(Flow::Normal(Some(self.expression(expr)?))),
        }
    }

    fn is_read_only(&self, name: &str) -> bool {
        self.variables.contains(name)
            || Namespace::global(name).is_some()
            || Builtin::global(name).is_some()
    }

    fn lookup(&self, name: &str) -> Result<Value, ScriptFault> {
        if let Some(local) = self.scopes.iter().rev().find_map(|scope| scope.get(name)) {
            return Ok(local.value.clone());
        }
        if let Some(value) = self.variables.get(name) {
            return Ok(Value::Data(value.clone()));
        }
        if let Some(namespace) = Namespace::global(name) {
            return Ok(Value::Namespace(namespace));
        }
        if let Some(builtin) = Builtin::global(name) {
            return Ok(Value::Builtin(builtin));
        }
        Err(ScriptFault::Runtime(format!("`{name}` is not defined")))
    }

    fn data(&mut self, expr: &Expr, context: &str) -> Result<ScriptValue, SandboxError> {
        Ok(self.expression(expr)?.into_data(context)?)
    }

    fn expression(&mut self, expr: &Expr) -> Result<Value, SandboxError> {
        self.tick()?;
        let value = match expr {
            Expr::Number(n) => Value::Data(ScriptValue::Number(*n)),
            Expr::Text(s) => Value::Data(ScriptValue::Text(s.clone())),
            Expr::Bool(b) => Value::Data(ScriptValue::Bool(*b)),
            Expr::Null => Value::Data(ScriptValue::Null),
            Expr::Ident(name) => self.lookup(name)?,
            Expr::Member { object, property } => {
                let object = self.expression(object)?;
                member(object, property)?
            }
            Expr::Call { callee, args } => {
                let callee = self.expression(callee)?;
                let Value::Builtin(builtin) = callee else {
                    return Err(ScriptFault::Runtime("value is not callable".to_owned()).into());
                };
                let mut numbers = Vec::with_capacity(args.len());
                for arg in args {
                    match self.data(arg, "argument")? {
                        ScriptValue::Number(n) => numbers.push(n),
                        other => {
                            return Err(ScriptFault::Runtime(format!(
                                "{}() expects numbers, got {}",
                                builtin.name(),
                                other.type_name()
                            ))
                            .into());
                        }
                    }
                }
                Value::Data(capabilities::invoke(
                    builtin,
                    &numbers,
                    &mut *self.rng,
                    self.dice,
                )?)
            }
            Expr::Unary { op, operand } => {
                let operand = self.data(operand, "operand")?;
                Value::Data(match op {
                    UnaryOp::Not => ScriptValue::Bool(!operand.is_truthy()),
                    UnaryOp::Negate => match operand {
                        ScriptValue::Number(n) => ScriptValue::Number(-n),
                        other => {
                            return Err(ScriptFault::Runtime(format!(
                                "cannot negate {}",
                                other.type_name()
                            ))
                            .into());
                        }
                    },
                })
            }
            Expr::Binary { op, left, right } => {
                let left = self.data(left, "left operand")?;
                let right = self.data(right, "right operand")?;
                Value::Data(binary(*op, left, right, self.max_text_bytes)?)
            }
            Expr::Logical { op, left, right } => {
                let left = self.data(left, "left operand")?;
                let short_circuit = match op {
                    LogicalOp::And => !left.is_truthy(),
                    LogicalOp::Or => left.is_truthy(),
                };
                if short_circuit {
                    Value::Data(left)
                } else {
                    Value::Data(self.data(right, "right operand")?)
                }
            }
            Expr::Conditional {
                condition,
                then,
                otherwise,
            } => {
                if self.data(condition, "condition")?.is_truthy() {
                    self.expression(then)?
                } else {
                    self.expression(otherwise)?
                }
            }
        };
        Ok(value)
    }
}

fn member(object: Value, property: &str) -> Result<Value, ScriptFault> {
    match object {
        Value::Namespace(namespace) => namespace
            .member(property)
            .map(Value::Builtin)
            .ok_or_else(|| ScriptFault::Runtime(format!("no capability named `{property}`"))),
        Value::Data(ScriptValue::Record(record)) => record
            .get(property)
            .cloned()
            .map(Value::Data)
            .ok_or_else(|| ScriptFault::Runtime(format!("record has no field `{property}`"))),
        Value::Data(other) => Err(ScriptFault::Runtime(format!(
            "cannot read `{property}` of {}",
            other.type_name()
        ))),
        Value::Builtin(builtin) => Err(ScriptFault::Runtime(format!(
            "cannot read `{property}` of {}()",
            builtin.name()
        ))),
    }
}

fn numbers(
    op: BinaryOp,
    left: &ScriptValue,
    right: &ScriptValue,
) -> Result<(f64, f64), ScriptFault> {
    match (left, right) {
        (ScriptValue::Number(a), ScriptValue::Number(b)) => Ok((*a, *b)),
        _ => Err(ScriptFault::Runtime(format!(
            "{op:?} needs numbers, got {} and {}",
            left.type_name(),
            right.type_name()
        ))),
    }
}

/// Arithmetic must stay finite; NaN and infinities are faults.
fn finite(op: BinaryOp, value: f64) -> Result<ScriptValue, ScriptFault> {
    if value.is_finite() {
        Ok(ScriptValue::Number(value))
    } else {
        Err(ScriptFault::Runtime(format!("{op:?} produced a non-finite number")))
    }
}

fn binary(
    op: BinaryOp,
    left: ScriptValue,
    right: ScriptValue,
    max_text_bytes: usize,
) -> Result<ScriptValue, ScriptFault> {
    use ScriptValue::{Bool, Number, Text};

    let value = match op {
        BinaryOp::Add => match (&left, &right) {
            (Number(a), Number(b)) => finite(op, a + b)?,
            (Text(_), _) | (_, Text(_)) => {
                let joined = format!("{left}{right}");
                if joined.len() > max_text_bytes {
                    return Err(ScriptFault::LimitExceeded(format!(
                        "text longer than {max_text_bytes} bytes"
                    )));
                }
                Text(joined)
            }
            _ => {
                return Err(ScriptFault::Runtime(format!(
                    "cannot add {} and {}",
                    left.type_name(),
                    right.type_name()
                )));
            }
        },
        BinaryOp::Subtract => {
            let (a, b) = numbers(op, &left, &right)?;
            finite(op, a - b)?
        }
        BinaryOp::Multiply => {
            let (a, b) = numbers(op, &left, &right)?;
            finite(op, a * b)?
        }
        BinaryOp::Divide | BinaryOp::Remainder => {
            let (a, b) = numbers(op, &left, &right)?;
            if b == 0.0 {
                return Err(ScriptFault::Runtime("division by zero".to_owned()));
            }
            finite(op, if op == BinaryOp::Divide { a / b } else { a % b })?
        }
        BinaryOp::Eq => Bool(left == right),
        BinaryOp::NotEq => Bool(left != right),
        BinaryOp::Less | BinaryOp::LessEq | BinaryOp::Greater | BinaryOp::GreaterEq => {
            let ordering = match (&left, &right) {
                (Number(a), Number(b)) => a.partial_cmp(b),
                (Text(a), Text(b)) => Some(a.cmp(b)),
                _ => {
                    return Err(ScriptFault::Runtime(format!(
                        "cannot compare {} and {}",
                        left.type_name(),
                        right.type_name()
                    )));
                }
            };
            let Some(ordering) = ordering else {
                return Ok(Bool(false));
            };
            Bool(match op {
                BinaryOp::Less => ordering.is_lt(),
                BinaryOp::LessEq => ordering.is_le(),
                BinaryOp::Greater => ordering.is_gt(),
                _ => ordering.is_ge(),
            })
        }
    };
    Ok(value)
}
