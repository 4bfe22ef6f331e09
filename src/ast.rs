use crate::expr::Expr;
use crate::token::TokenType;

/// Converts an expression to a parenthesized prefix form.
///
/// Debug aid; the parser tests use it to snapshot tree shapes without
/// walking nodes by hand.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(expr: &Expr) -> String {
        match expr {
            Expr::Literal(token) => match &token.token_type {
                TokenType::NUMBER(n) => {
                    if n.fract() == 0.0 {
                        // 3.0 → 3.0 form, matching token display
                        format!("{:.1}", n)
                    } else {
                        n.to_string()
                    }
                }

                TokenType::STRING(s) => s.to_string(),

                TokenType::TRUE => "true".to_string(),

                TokenType::FALSE => "false".to_string(),

                TokenType::NIL => "nil".to_string(),

                _ => "?literal".to_string(),
            },

            Expr::Grouping(inner) => format!("(group {})", Self::print(inner)),

            Expr::Unary(operator, right) => {
                format!("({} {})", operator.lexeme, Self::print(right))
            }

            Expr::Binary(left, operator, right) | Expr::Logical(left, operator, right) => {
                format!(
                    "({} {} {})",
                    operator.lexeme,
                    Self::print(left),
                    Self::print(right)
                )
            }

            Expr::Variable { name, .. } => name.lexeme.clone(),

            Expr::Assign { name, value, .. } => {
                format!("(= {} {})", name.lexeme, Self::print(value))
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                let mut out = format!("(call {}", Self::print(callee));
                for arg in arguments {
                    out.push(' ');
                    out.push_str(&Self::print(arg));
                }
                out.push(')');
                out
            }

            Expr::Get { object, name } => {
                format!("(. {} {})", Self::print(object), name.lexeme)
            }

            Expr::Set {
                object,
                name,
                value,
            } => format!(
                "(= (. {} {}) {})",
                Self::print(object),
                name.lexeme,
                Self::print(value)
            ),

            Expr::Index { object, index, .. } => {
                format!("([] {} {})", Self::print(object), Self::print(index))
            }

            Expr::SetIndex {
                object,
                index,
                value,
                ..
            } => format!(
                "(= ([] {} {}) {})",
                Self::print(object),
                Self::print(index),
                Self::print(value)
            ),

            Expr::SelfExpr { .. } => "self".to_string(),

            Expr::Super { method, .. } => format!("(super {})", method.lexeme),

            Expr::List { elements, .. } => {
                let mut out = String::from("(list");
                for element in elements {
                    out.push(' ');
                    out.push_str(&Self::print(element));
                }
                out.push(')');
                out
            }

            Expr::Dict { pairs, .. } => {
                let mut out = String::from("(dict");
                for (key, value) in pairs {
                    out.push_str(&format!(" ({} {})", Self::print(key), Self::print(value)));
                }
                out.push(')');
                out
            }

            Expr::Safe(inner) => format!("(? {})", Self::print(inner)),
        }
    }
}
