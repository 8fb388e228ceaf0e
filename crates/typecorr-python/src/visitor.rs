// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Visitor trait and walk functions for module outlines.
//!
//! The traversal order follows the CST visitor pattern:
//!
//! - **Pre-order**: `visit_*` is called before descending into children
//! - **Post-order**: `leave_*` is called after all children have been visited
//! - **Source order**: a function's parameters are visited before its body
//!
//! # Control Flow
//!
//! - `VisitResult::Continue` - traverse into children
//! - `VisitResult::SkipChildren` - skip children but still call `leave_*`
//! - `VisitResult::Stop` - halt traversal immediately (no `leave_*` called)

use crate::outline::{ClassDef, Definition, FunctionDef, ModuleOutline, Param};

/// Result of visiting a node - controls traversal behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum VisitResult {
    /// Continue traversal into children.
    #[default]
    Continue,

    /// Skip children, continue with siblings.
    ///
    /// `leave_*` is still called for this node.
    SkipChildren,

    /// Stop traversal entirely.
    Stop,
}

/// Visitor over outline nodes. Every method defaults to a no-op.
pub trait Visitor<'a> {
    fn visit_module(&mut self, _node: &'a ModuleOutline) -> VisitResult {
        VisitResult::Continue
    }
    fn leave_module(&mut self, _node: &'a ModuleOutline) {}

    fn visit_class_def(&mut self, _node: &'a ClassDef) -> VisitResult {
        VisitResult::Continue
    }
    fn leave_class_def(&mut self, _node: &'a ClassDef) {}

    fn visit_function_def(&mut self, _node: &'a FunctionDef) -> VisitResult {
        VisitResult::Continue
    }
    fn leave_function_def(&mut self, _node: &'a FunctionDef) {}

    fn visit_param(&mut self, _node: &'a Param) -> VisitResult {
        VisitResult::Continue
    }
    fn leave_param(&mut self, _node: &'a Param) {}
}

// ============================================================================
// Walk functions
// ============================================================================

/// Walk a [`ModuleOutline`] and its definitions.
pub fn walk_module<'a, V: Visitor<'a>>(visitor: &mut V, node: &'a ModuleOutline) -> VisitResult {
    match visitor.visit_module(node) {
        VisitResult::Stop => return VisitResult::Stop,
        VisitResult::SkipChildren => {}
        VisitResult::Continue => {
            if walk_body(visitor, &node.body) == VisitResult::Stop {
                return VisitResult::Stop;
            }
        }
    }
    visitor.leave_module(node);
    VisitResult::Continue
}

fn walk_body<'a, V: Visitor<'a>>(visitor: &mut V, body: &'a [Definition]) -> VisitResult {
    for def in body {
        if walk_definition(visitor, def) == VisitResult::Stop {
            return VisitResult::Stop;
        }
    }
    VisitResult::Continue
}

/// Walk one definition. Imports have no visitor hooks.
pub fn walk_definition<'a, V: Visitor<'a>>(visitor: &mut V, node: &'a Definition) -> VisitResult {
    match node {
        Definition::Class(c) => walk_class_def(visitor, c),
        Definition::Function(f) => walk_function_def(visitor, f),
        Definition::ImportFrom(_) => VisitResult::Continue,
    }
}

/// Walk a [`ClassDef`]: `visit_class_def`, body, `leave_class_def`.
pub fn walk_class_def<'a, V: Visitor<'a>>(visitor: &mut V, node: &'a ClassDef) -> VisitResult {
    match visitor.visit_class_def(node) {
        VisitResult::Stop => return VisitResult::Stop,
        VisitResult::SkipChildren => {}
        VisitResult::Continue => {
            if walk_body(visitor, &node.body) == VisitResult::Stop {
                return VisitResult::Stop;
            }
        }
    }
    visitor.leave_class_def(node);
    VisitResult::Continue
}

/// Walk a [`FunctionDef`]: `visit_function_def`, params, body,
/// `leave_function_def`.
pub fn walk_function_def<'a, V: Visitor<'a>>(visitor: &mut V, node: &'a FunctionDef) -> VisitResult {
    match visitor.visit_function_def(node) {
        VisitResult::Stop => return VisitResult::Stop,
        VisitResult::SkipChildren => {}
        VisitResult::Continue => {
            for param in &node.params {
                if walk_param(visitor, param) == VisitResult::Stop {
                    return VisitResult::Stop;
                }
            }
            if walk_body(visitor, &node.body) == VisitResult::Stop {
                return VisitResult::Stop;
            }
        }
    }
    visitor.leave_function_def(node);
    VisitResult::Continue
}

/// Walk a [`Param`].
pub fn walk_param<'a, V: Visitor<'a>>(visitor: &mut V, node: &'a Param) -> VisitResult {
    match visitor.visit_param(node) {
        VisitResult::Stop => return VisitResult::Stop,
        VisitResult::SkipChildren | VisitResult::Continue => {}
    }
    visitor.leave_param(node);
    VisitResult::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::parse_outline;

    /// Records the traversal as `visit:`/`leave:` events.
    #[derive(Default)]
    struct EventLog {
        events: Vec<String>,
        skip: Option<&'static str>,
        stop_at: Option<&'static str>,
    }

    impl<'a> Visitor<'a> for EventLog {
        fn visit_class_def(&mut self, node: &'a ClassDef) -> VisitResult {
            self.events.push(format!("visit:{}", node.name));
            VisitResult::Continue
        }
        fn leave_class_def(&mut self, node: &'a ClassDef) {
            self.events.push(format!("leave:{}", node.name));
        }
        fn visit_function_def(&mut self, node: &'a FunctionDef) -> VisitResult {
            self.events.push(format!("visit:{}", node.name));
            if self.stop_at == Some(node.name.as_str()) {
                VisitResult::Stop
            } else if self.skip == Some(node.name.as_str()) {
                VisitResult::SkipChildren
            } else {
                VisitResult::Continue
            }
        }
        fn leave_function_def(&mut self, node: &'a FunctionDef) {
            self.events.push(format!("leave:{}", node.name));
        }
        fn visit_param(&mut self, node: &'a Param) -> VisitResult {
            self.events.push(format!("param:{}", node.name));
            VisitResult::Continue
        }
    }

    const SOURCE: &str = "class A:\n    def f(self, x):\n        def inner(y):\n            pass\n\ndef g(z):\n    pass\n";

    #[test]
    fn walk_order_is_pre_and_post_order() {
        let outline = parse_outline(SOURCE).unwrap();
        let mut log = EventLog::default();
        assert_eq!(walk_module(&mut log, &outline), VisitResult::Continue);
        assert_eq!(
            log.events,
            vec![
                "visit:A", "visit:f", "param:self", "param:x", "visit:inner", "param:y",
                "leave:inner", "leave:f", "leave:A", "visit:g", "param:z", "leave:g",
            ]
        );
    }

    #[test]
    fn skip_children_still_leaves() {
        let outline = parse_outline(SOURCE).unwrap();
        let mut log = EventLog {
            skip: Some("f"),
            ..Default::default()
        };
        walk_module(&mut log, &outline);
        assert_eq!(
            log.events,
            vec!["visit:A", "visit:f", "leave:f", "leave:A", "visit:g", "param:z", "leave:g"]
        );
    }

    #[test]
    fn stop_halts_without_leaving() {
        let outline = parse_outline(SOURCE).unwrap();
        let mut log = EventLog {
            stop_at: Some("f"),
            ..Default::default()
        };
        assert_eq!(walk_module(&mut log, &outline), VisitResult::Stop);
        assert_eq!(log.events, vec!["visit:A", "visit:f"]);
    }
}
