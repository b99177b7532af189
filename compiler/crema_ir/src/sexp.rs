//! Serializable s-expression form of the AST.
//!
//! Every node serializes to a JSON array whose first element is the
//! node's operator/kind tag and whose remaining elements are its
//! children in a fixed per-kind order. Nodes carrying a source origin
//! are additionally wrapped as `["line", lineNumber, node]`.
//!
//! The form round-trips: deserializing and re-serializing produces an
//! identical value, and the deserialized [`Program`] is exactly what
//! the evaluator consumes. On-disk caching of this form is an external
//! collaborator's concern.

use serde_json::{json, Value as Json};

use crate::{
    Ast, BranchKind, Case, CaseId, CaseOp, ExprId, ExprKind, FormatPart, HoistedDecl, Literal,
    OpKind, Origin, Program, ProtoMember,
};

/// Error while reading the s-expression form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SexpError {
    #[error("unknown node tag `{0}`")]
    UnknownTag(String),
    #[error("malformed node: {0}")]
    Malformed(&'static str),
}

/// Serialize a program to its s-expression form.
pub fn to_json(program: &Program) -> Json {
    write_expr(&program.ast, program.root)
}

/// Deserialize a program from its s-expression form.
pub fn from_json(value: &Json) -> Result<Program, SexpError> {
    let mut reader = Reader { ast: Ast::new() };
    let root = reader.expr(value)?;
    Ok(Program { ast: reader.ast, root })
}

fn write_expr(ast: &Ast, id: ExprId) -> Json {
    let expr = ast.expr(id);
    let node = write_kind(ast, &expr.kind);
    match expr.origin {
        Some(origin) => json!(["line", origin.line, node]),
        None => node,
    }
}

fn write_opt(ast: &Ast, id: Option<ExprId>) -> Json {
    match id {
        Some(id) => write_expr(ast, id),
        None => Json::Null,
    }
}

fn write_list(ast: &Ast, ids: &[ExprId]) -> Json {
    Json::Array(ids.iter().map(|&id| write_expr(ast, id)).collect())
}

fn write_members(ast: &Ast, members: &[ProtoMember]) -> Json {
    Json::Array(
        members
            .iter()
            .map(|m| json!([m.name, write_opt(ast, m.value)]))
            .collect(),
    )
}

fn write_case(ast: &Ast, id: CaseId) -> Json {
    let case = ast.case(id);
    let node = json!([
        "case",
        case.op.as_str(),
        write_opt(ast, case.value),
        write_expr(ast, case.body),
        case.falls_through,
    ]);
    match case.origin {
        Some(origin) => json!(["line", origin.line, node]),
        None => node,
    }
}

fn write_kind(ast: &Ast, kind: &ExprKind) -> Json {
    match kind {
        ExprKind::Literal(lit) => {
            let v = match lit {
                Literal::None => Json::Null,
                Literal::Bool(b) => json!(b),
                Literal::Int(n) => json!(n),
                Literal::Float(f) => json!(f),
                Literal::Str(s) => json!(s),
            };
            json!(["const", v])
        }
        ExprKind::Ident { name, mutable } => json!(["id", name, mutable]),
        ExprKind::Spread(inner) => json!(["...", write_expr(ast, *inner)]),
        ExprKind::Assign { target, value, op } => json!([
            "=",
            op.map(OpKind::as_str),
            write_expr(ast, *target),
            write_expr(ast, *value),
        ]),
        ExprKind::Tuple(elems) => {
            let mut out = vec![json!("tuple")];
            out.extend(elems.iter().map(|&e| write_expr(ast, e)));
            Json::Array(out)
        }
        ExprKind::Call { callee, args } => {
            json!(["call", write_expr(ast, *callee), write_list(ast, args)])
        }
        ExprKind::Index { object, subscripts } => {
            json!([".", write_expr(ast, *object), write_list(ast, subscripts)])
        }
        ExprKind::Bind { object, member } => {
            json!(["->", write_expr(ast, *object), write_expr(ast, *member)])
        }
        ExprKind::Descope { object, member } => {
            json!(["::", write_expr(ast, *object), write_expr(ast, *member)])
        }
        ExprKind::Loop { always, cond, body, then_branch, else_branch } => json!([
            "loop",
            write_opt(ast, *always),
            write_opt(ast, *cond),
            write_opt(ast, *body),
            write_opt(ast, *then_branch),
            write_opt(ast, *else_branch),
        ]),
        ExprKind::If { cond, then_branch, else_branch } => json!([
            "if",
            write_expr(ast, *cond),
            write_expr(ast, *then_branch),
            write_opt(ast, *else_branch),
        ]),
        ExprKind::Branch { kind, level } => json!([kind.as_str(), level]),
        ExprKind::Op { op, operands } => {
            let mut out = vec![json!(op.as_str())];
            out.extend(operands.iter().map(|&e| write_expr(ast, e)));
            Json::Array(out)
        }
        ExprKind::Import(inner) => json!(["import", write_expr(ast, *inner)]),
        ExprKind::Proto { name, parent, public, private, statics } => json!([
            "proto",
            name,
            write_opt(ast, *parent),
            write_members(ast, public),
            write_members(ast, private),
            write_members(ast, statics),
        ]),
        ExprKind::Return(inner) => json!(["return", write_expr(ast, *inner)]),
        ExprKind::Fail(inner) => json!(["fail", write_expr(ast, *inner)]),
        ExprKind::Format(parts) => {
            let mut out = vec![json!("format")];
            out.extend(parts.iter().map(|p| match p {
                FormatPart::Text(s) => json!(s),
                FormatPart::Expr(e) => write_expr(ast, *e),
            }));
            Json::Array(out)
        }
        ExprKind::Switch { scrutinee, cases, default: _, then_branch, else_branch } => {
            // The default case is serialized in its source position in
            // `cases`; the deserializer re-derives which entry it is.
            json!([
                "switch",
                write_expr(ast, *scrutinee),
                Json::Array(cases.iter().map(|&c| write_case(ast, c)).collect()),
                write_opt(ast, *then_branch),
                write_opt(ast, *else_branch),
            ])
        }
        ExprKind::Object(entries) => {
            let mut out = vec![json!("object")];
            out.extend(
                entries
                    .iter()
                    .map(|(k, v)| json!([write_expr(ast, *k), write_expr(ast, *v)])),
            );
            Json::Array(out)
        }
        ExprKind::List(elems) => {
            let mut out = vec![json!("list")];
            out.extend(elems.iter().map(|&e| write_expr(ast, e)));
            Json::Array(out)
        }
        ExprKind::ForLoop { binding, iterable, body, then_branch, else_branch } => json!([
            "for",
            write_expr(ast, *binding),
            write_expr(ast, *iterable),
            write_expr(ast, *body),
            write_opt(ast, *then_branch),
            write_opt(ast, *else_branch),
        ]),
        ExprKind::Block { stmts, hoisted } => json!([
            "block",
            write_list(ast, stmts),
            Json::Array(
                hoisted
                    .iter()
                    .map(|h| json!([h.name, h.mutable]))
                    .collect()
            ),
        ]),
        ExprKind::Function { name, params, body } => json!([
            "fn",
            name,
            write_list(ast, params),
            write_expr(ast, *body),
        ]),
        ExprKind::After { value, update } => {
            json!(["after", write_expr(ast, *value), write_expr(ast, *update)])
        }
        ExprKind::Try { body, binding, handler, then_branch, else_branch } => json!([
            "try",
            write_expr(ast, *body),
            write_expr(ast, *binding),
            write_expr(ast, *handler),
            write_opt(ast, *then_branch),
            write_opt(ast, *else_branch),
        ]),
    }
}

struct Reader {
    ast: Ast,
}

impl Reader {
    fn expr(&mut self, value: &Json) -> Result<ExprId, SexpError> {
        let (tag, rest, origin) = split_node(value)?;
        let kind = self.kind(tag, rest)?;
        Ok(self.ast.alloc(kind, origin))
    }

    fn opt_expr(&mut self, value: &Json) -> Result<Option<ExprId>, SexpError> {
        if value.is_null() {
            Ok(None)
        } else {
            Ok(Some(self.expr(value)?))
        }
    }

    fn expr_list(&mut self, value: &Json) -> Result<Vec<ExprId>, SexpError> {
        let items = value
            .as_array()
            .ok_or(SexpError::Malformed("expected a child list"))?;
        items.iter().map(|v| self.expr(v)).collect()
    }

    fn members(&mut self, value: &Json) -> Result<Vec<ProtoMember>, SexpError> {
        let items = value
            .as_array()
            .ok_or(SexpError::Malformed("expected a member list"))?;
        items
            .iter()
            .map(|entry| {
                let pair = entry
                    .as_array()
                    .filter(|a| a.len() == 2)
                    .ok_or(SexpError::Malformed("expected [name, value] member"))?;
                let name = as_string(&pair[0])?;
                let value = self.opt_expr(&pair[1])?;
                Ok(ProtoMember { name, value })
            })
            .collect()
    }

    fn case(&mut self, value: &Json) -> Result<CaseId, SexpError> {
        let (tag, rest, origin) = split_node(value)?;
        if tag != "case" || rest.len() != 4 {
            return Err(SexpError::Malformed("expected a case node"));
        }
        let op = match rest[0].as_str() {
            Some("=") => CaseOp::Eq,
            Some("in") => CaseOp::In,
            Some("else") => CaseOp::Else,
            _ => return Err(SexpError::Malformed("unknown case op")),
        };
        let value = self.opt_expr(&rest[1])?;
        let body = self.expr(&rest[2])?;
        let falls_through = rest[3]
            .as_bool()
            .ok_or(SexpError::Malformed("case fallthrough must be a bool"))?;
        Ok(self.ast.alloc_case(Case {
            op,
            value,
            body,
            falls_through,
            next: None,
            origin,
        }))
    }

    fn switch(&mut self, rest: &[Json]) -> Result<ExprKind, SexpError> {
        if rest.len() != 4 {
            return Err(SexpError::Malformed("switch expects 4 children"));
        }
        let scrutinee = self.expr(&rest[0])?;
        let case_values = rest[1]
            .as_array()
            .ok_or(SexpError::Malformed("switch cases must be a list"))?;
        let mut cases = Vec::with_capacity(case_values.len());
        for v in case_values {
            cases.push(self.case(v)?);
        }

        // Replay the parser's single-pass fallthrough linking: a `:`
        // case links to the immediately following case in the list.
        for i in 0..cases.len() {
            if self.ast.case(cases[i]).falls_through {
                self.ast.set_case_next(cases[i], cases.get(i + 1).copied());
            }
        }
        let default = cases
            .iter()
            .copied()
            .find(|&c| self.ast.case(c).op == CaseOp::Else);

        let then_branch = self.opt_expr(&rest[2])?;
        let else_branch = self.opt_expr(&rest[3])?;
        Ok(ExprKind::Switch { scrutinee, cases, default, then_branch, else_branch })
    }

    fn kind(&mut self, tag: &str, rest: &[Json]) -> Result<ExprKind, SexpError> {
        Ok(match (tag, rest.len()) {
            ("const", 1) => ExprKind::Literal(read_literal(&rest[0])?),
            ("id", 2) => ExprKind::Ident {
                name: as_string(&rest[0])?,
                mutable: rest[1]
                    .as_bool()
                    .ok_or(SexpError::Malformed("id mutability must be a bool"))?,
            },
            ("...", 1) => ExprKind::Spread(self.expr(&rest[0])?),
            ("=", 3) => {
                let op = match rest[0].as_str() {
                    Some(s) => Some(
                        OpKind::from_str(s)
                            .ok_or(SexpError::Malformed("unknown compound assign op"))?,
                    ),
                    None => None,
                };
                ExprKind::Assign {
                    target: self.expr(&rest[1])?,
                    value: self.expr(&rest[2])?,
                    op,
                }
            }
            ("tuple", _) => {
                let elems = rest.iter().map(|v| self.expr(v)).collect::<Result<_, _>>()?;
                ExprKind::Tuple(elems)
            }
            ("call", 2) => ExprKind::Call {
                callee: self.expr(&rest[0])?,
                args: self.expr_list(&rest[1])?,
            },
            (".", 2) => ExprKind::Index {
                object: self.expr(&rest[0])?,
                subscripts: self.expr_list(&rest[1])?,
            },
            ("->", 2) => ExprKind::Bind {
                object: self.expr(&rest[0])?,
                member: self.expr(&rest[1])?,
            },
            ("::", 2) => ExprKind::Descope {
                object: self.expr(&rest[0])?,
                member: self.expr(&rest[1])?,
            },
            ("loop", 5) => ExprKind::Loop {
                always: self.opt_expr(&rest[0])?,
                cond: self.opt_expr(&rest[1])?,
                body: self.opt_expr(&rest[2])?,
                then_branch: self.opt_expr(&rest[3])?,
                else_branch: self.opt_expr(&rest[4])?,
            },
            ("if", 3) => ExprKind::If {
                cond: self.expr(&rest[0])?,
                then_branch: self.expr(&rest[1])?,
                else_branch: self.opt_expr(&rest[2])?,
            },
            ("break" | "continue" | "redo", 1) => {
                let kind = match tag {
                    "break" => BranchKind::Break,
                    "continue" => BranchKind::Continue,
                    _ => BranchKind::Redo,
                };
                let level = rest[0]
                    .as_u64()
                    .ok_or(SexpError::Malformed("branch level must be an integer"))?;
                ExprKind::Branch {
                    kind,
                    level: u32::try_from(level)
                        .map_err(|_| SexpError::Malformed("branch level out of range"))?,
                }
            }
            ("import", 1) => ExprKind::Import(self.expr(&rest[0])?),
            ("proto", 5) => ExprKind::Proto {
                name: opt_string(&rest[0])?,
                parent: self.opt_expr(&rest[1])?,
                public: self.members(&rest[2])?,
                private: self.members(&rest[3])?,
                statics: self.members(&rest[4])?,
            },
            ("return", 1) => ExprKind::Return(self.expr(&rest[0])?),
            ("fail", 1) => ExprKind::Fail(self.expr(&rest[0])?),
            ("format", _) => {
                let parts = rest
                    .iter()
                    .map(|v| match v.as_str() {
                        Some(s) => Ok(FormatPart::Text(s.to_owned())),
                        None => Ok(FormatPart::Expr(self.expr(v)?)),
                    })
                    .collect::<Result<_, SexpError>>()?;
                ExprKind::Format(parts)
            }
            ("switch", _) => self.switch(rest)?,
            ("object", _) => {
                let entries = rest
                    .iter()
                    .map(|entry| {
                        let pair = entry
                            .as_array()
                            .filter(|a| a.len() == 2)
                            .ok_or(SexpError::Malformed("expected [key, value] entry"))?;
                        Ok((self.expr(&pair[0])?, self.expr(&pair[1])?))
                    })
                    .collect::<Result<_, SexpError>>()?;
                ExprKind::Object(entries)
            }
            ("list", _) => {
                let elems = rest.iter().map(|v| self.expr(v)).collect::<Result<_, _>>()?;
                ExprKind::List(elems)
            }
            ("for", 5) => ExprKind::ForLoop {
                binding: self.expr(&rest[0])?,
                iterable: self.expr(&rest[1])?,
                body: self.expr(&rest[2])?,
                then_branch: self.opt_expr(&rest[3])?,
                else_branch: self.opt_expr(&rest[4])?,
            },
            ("block", 2) => {
                let stmts = self.expr_list(&rest[0])?;
                let hoisted = rest[1]
                    .as_array()
                    .ok_or(SexpError::Malformed("hoisted decls must be a list"))?
                    .iter()
                    .map(|entry| {
                        let pair = entry
                            .as_array()
                            .filter(|a| a.len() == 2)
                            .ok_or(SexpError::Malformed("expected [name, mutable] decl"))?;
                        Ok(HoistedDecl {
                            name: as_string(&pair[0])?,
                            mutable: pair[1]
                                .as_bool()
                                .ok_or(SexpError::Malformed("mutability must be a bool"))?,
                        })
                    })
                    .collect::<Result<_, SexpError>>()?;
                ExprKind::Block { stmts, hoisted }
            }
            ("fn", 3) => ExprKind::Function {
                name: opt_string(&rest[0])?,
                params: self.expr_list(&rest[1])?,
                body: self.expr(&rest[2])?,
            },
            ("after", 2) => ExprKind::After {
                value: self.expr(&rest[0])?,
                update: self.expr(&rest[1])?,
            },
            ("try", 5) => ExprKind::Try {
                body: self.expr(&rest[0])?,
                binding: self.expr(&rest[1])?,
                handler: self.expr(&rest[2])?,
                then_branch: self.opt_expr(&rest[3])?,
                else_branch: self.opt_expr(&rest[4])?,
            },
            _ => {
                // Operator nodes use the operator's surface syntax as
                // their tag.
                if let Some(op) = OpKind::from_str(tag) {
                    if rest.is_empty() {
                        return Err(SexpError::Malformed("operator node with no operands"));
                    }
                    let operands =
                        rest.iter().map(|v| self.expr(v)).collect::<Result<_, _>>()?;
                    ExprKind::Op { op, operands }
                } else {
                    return Err(SexpError::UnknownTag(tag.to_owned()));
                }
            }
        })
    }
}

/// Split a node into (tag, children, origin), unwrapping `["line", n,
/// node]` wrappers.
fn split_node(value: &Json) -> Result<(&str, &[Json], Option<Origin>), SexpError> {
    let items = value
        .as_array()
        .ok_or(SexpError::Malformed("node must be an array"))?;
    let tag = items
        .first()
        .and_then(Json::as_str)
        .ok_or(SexpError::Malformed("node tag must be a string"))?;

    if tag == "line" {
        if items.len() != 3 {
            return Err(SexpError::Malformed("line wrapper expects [line, n, node]"));
        }
        let line = items[1]
            .as_u64()
            .ok_or(SexpError::Malformed("line number must be an integer"))?;
        let (inner_tag, rest, _) = split_node(&items[2])?;
        let line = u32::try_from(line).map_err(|_| SexpError::Malformed("line out of range"))?;
        return Ok((inner_tag, rest, Some(Origin::line_only(line))));
    }

    Ok((tag, &items[1..], None))
}

fn read_literal(value: &Json) -> Result<Literal, SexpError> {
    Ok(match value {
        Json::Null => Literal::None,
        Json::Bool(b) => Literal::Bool(*b),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Literal::Int(i)
            } else {
                Literal::Float(n.as_f64().ok_or(SexpError::Malformed("bad number"))?)
            }
        }
        Json::String(s) => Literal::Str(s.clone()),
        _ => return Err(SexpError::Malformed("unsupported literal")),
    })
}

fn as_string(value: &Json) -> Result<String, SexpError> {
    value
        .as_str()
        .map(str::to_owned)
        .ok_or(SexpError::Malformed("expected a string"))
}

fn opt_string(value: &Json) -> Result<Option<String>, SexpError> {
    if value.is_null() {
        Ok(None)
    } else {
        as_string(value).map(Some)
    }
}
