//! Declarations: `var`/`const` groups, function literals, protos.

use crema_ir::{ExprId, ExprKind, Origin, ProtoMember};
use crema_lexer::Kw;

use crate::error::ParseError;
use crate::precedence::SPREAD_PREC;

use super::Parser;

/// Destination partition of a proto member.
enum Partition {
    Public,
    Private,
    Static,
}

impl Parser {
    /// A `var`/`const` declaration group, keyword already consumed.
    ///
    /// Names hoist to the innermost enclosing block; initializers stay
    /// in place as ordinary assignments. Initializers parse above the
    /// tuple comma so `var a = 1, b, c = 3` declares three names.
    pub(super) fn decl_group(
        &mut self,
        mutable: bool,
        origin: Origin,
    ) -> Result<Vec<ExprId>, ParseError> {
        let mut group = Vec::new();
        loop {
            let (name, name_origin) = self.cursor.expect_ident()?;
            self.hoist(&name, mutable);
            let target = self.alloc(ExprKind::Ident { name, mutable }, name_origin);

            if self.cursor.maybe_assign() {
                let value = self.require_expr(SPREAD_PREC)?;
                group.push(self.alloc(ExprKind::Assign { target, value, op: None }, origin));
            }
            if !self.cursor.maybe_punct(",") {
                break;
            }
        }
        Ok(group)
    }

    /// `function [name] params block`. A named function declares its
    /// name in the enclosing block and yields the assignment.
    pub(super) fn parse_function(&mut self, origin: Origin) -> Result<ExprId, ParseError> {
        let name = self.cursor.maybe_ident();
        let params = self.func_params()?;
        let body = self.block()?;
        let func = self.alloc(
            ExprKind::Function {
                name: name.as_ref().map(|(n, _)| n.clone()),
                params,
                body,
            },
            origin,
        );
        match name {
            Some((name, name_origin)) => {
                self.hoist(&name, true);
                let target = self.alloc(ExprKind::Ident { name, mutable: true }, name_origin);
                Ok(self.alloc(ExprKind::Assign { target, value: func, op: None }, origin))
            }
            None => Ok(func),
        }
    }

    /// Parameters as a single l-value: a parenthesized tuple flattens
    /// into the parameter list, anything else is one parameter.
    fn func_params(&mut self) -> Result<Vec<ExprId>, ParseError> {
        let args = self.lvalue()?;
        match self.ast.kind(args) {
            ExprKind::Tuple(elems) => Ok(elems.clone()),
            _ => Ok(vec![args]),
        }
    }

    /// `proto [name] [is parent] { members }`.
    ///
    /// Members sort into public/private/static partitions by their
    /// qualifier (`public` and `var` both mean public, as does no
    /// qualifier). A named proto declares its name immutably.
    pub(super) fn parse_proto(&mut self, origin: Origin) -> Result<ExprId, ParseError> {
        let name = self.cursor.maybe_ident();
        let parent = if self.cursor.maybe_kw(Kw::Is) {
            Some(
                self.relaxid()?
                    .ok_or_else(|| self.cursor.expected("relaxed identifier"))?,
            )
        } else {
            None
        };
        self.cursor.expect_punct("{")?;

        let mut public = Vec::new();
        let mut private = Vec::new();
        let mut statics = Vec::new();

        while !self.cursor.maybe_punct("}") {
            if self.cursor.current().is_none() {
                return Err(self.cursor.expected("}"));
            }
            let partition = self.proto_qualifier();
            let members = self.proto_members()?;
            match partition {
                Partition::Public => public.extend(members),
                Partition::Private => private.extend(members),
                Partition::Static => statics.extend(members),
            }
            while self.cursor.maybe_punct(";") {}
        }

        let proto = self.alloc(
            ExprKind::Proto {
                name: name.as_ref().map(|(n, _)| n.clone()),
                parent,
                public,
                private,
                statics,
            },
            origin,
        );
        match name {
            Some((name, name_origin)) => {
                self.hoist(&name, false);
                let target = self.alloc(ExprKind::Ident { name, mutable: false }, name_origin);
                Ok(self.alloc(ExprKind::Assign { target, value: proto, op: None }, origin))
            }
            None => Ok(proto),
        }
    }

    fn proto_qualifier(&mut self) -> Partition {
        if self.cursor.maybe_kw(Kw::Private) {
            Partition::Private
        } else if self.cursor.maybe_kw(Kw::Static) {
            Partition::Static
        } else {
            let _ = self.cursor.maybe_kw(Kw::Public) || self.cursor.maybe_kw(Kw::Var);
            Partition::Public
        }
    }

    /// One member clause: a method `name(params) block`, or a
    /// comma-separated run of field names.
    fn proto_members(&mut self) -> Result<Vec<ProtoMember>, ParseError> {
        let (name, name_origin) = self.cursor.expect_word()?;

        if self.cursor.maybe_punct("(") {
            let params = self.listing(",", Parser::opt_lvalue)?;
            self.cursor.expect_punct(")")?;
            let body = self.block()?;
            let func = self.alloc(
                ExprKind::Function { name: Some(name.clone()), params, body },
                name_origin,
            );
            return Ok(vec![ProtoMember { name, value: Some(func) }]);
        }

        let mut members = vec![ProtoMember { name, value: None }];
        while self.cursor.maybe_punct(",") {
            let (extra, _) = self.cursor.expect_word()?;
            members.push(ProtoMember { name: extra, value: None });
        }
        Ok(members)
    }
}
