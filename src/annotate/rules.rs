//! The Go annotation rule table.

use crate::annotate::{on, Role, RuleSet};
use crate::syntax::ast;

use Role::*;

impl RuleSet {
    /// Rules for the native Go tree. Every Go structural type is expected to carry roles.
    pub fn go() -> Self {
        let mut set = RuleSet::new().with_root("File");
        set.expect(ast::descriptors().into_iter().map(|d| d.name));

        // Files, comments
        set.add(
            on("File")
                .roles(&[File])
                .child("Name", &[Package, Name])
                .child("Doc", &[Documentation]),
        );
        set.add(on("Comment").roles(&[Comment]));
        set.add(on("CommentGroup").roles(&[Comment, List]));

        // Names and literals
        set.add(on("Ident").roles(&[Identifier]));
        set.add(
            on("BasicLit")
                .roles(&[Literal, Primitive])
                .when("Kind", &["INT", "FLOAT", "IMAG"], &[Number])
                .when("Kind", &["STRING"], &[String])
                .when("Kind", &["CHAR"], &[Character]),
        );
        set.add(
            on("CompositeLit")
                .roles(&[Expression, Literal, Instance])
                .child("Type", &[Type])
                .child("Elts", &[Value]),
        );
        set.add(
            on("KeyValueExpr")
                .roles(&[Expression, Entry])
                .child("Key", &[Key])
                .child("Value", &[Value]),
        );
        set.add(
            on("FuncLit")
                .roles(&[Expression, Function, Literal, Anonymous])
                .child("Body", &[Function, Body]),
        );
        set.add(on("Ellipsis").roles(&[Type, Variadic]));

        // Expressions
        set.add(on("ParenExpr").roles(&[Expression]));
        set.add(
            on("SelectorExpr")
                .roles(&[Expression, Qualified, Identifier])
                .child("X", &[Qualified])
                .child("Sel", &[Member]),
        );
        set.add(
            on("IndexExpr")
                .roles(&[Expression, Index])
                .child("Index", &[Index, Key]),
        );
        set.add(
            on("SliceExpr")
                .roles(&[Expression, Slice])
                .child("Low", &[Left])
                .child("High", &[Right]),
        );
        set.add(
            on("TypeAssertExpr")
                .roles(&[Expression, Cast])
                .child("Type", &[Type]),
        );
        set.add(
            on("CallExpr")
                .roles(&[Expression, Call])
                .child("Fun", &[Call, Callee])
                .child("Args", &[Call, Argument, Positional]),
        );
        set.add(on("StarExpr").roles(&[Expression, Dereference]));
        set.add(
            on("UnaryExpr")
                .roles(&[Expression, Unary])
                .when("Op", &["-"], &[Arithmetic, Negative])
                .when("Op", &["+"], &[Arithmetic, Positive])
                .when("Op", &["!"], &[Boolean, Not])
                .when("Op", &["^"], &[Bitwise, Not])
                .when("Op", &["&"], &[TakeAddress])
                .when("Op", &["<-"], &[Channel, Receive]),
        );
        set.add(
            on("BinaryExpr")
                .roles(&[Expression, Binary, Operator])
                .child("X", &[Binary, Left])
                .child("Y", &[Binary, Right])
                .when("Op", &["+"], &[Arithmetic, Add])
                .when("Op", &["-"], &[Arithmetic, Subtract])
                .when("Op", &["*"], &[Arithmetic, Multiply])
                .when("Op", &["/"], &[Arithmetic, Divide])
                .when("Op", &["%"], &[Arithmetic, Modulo])
                .when("Op", &["&"], &[Bitwise, And])
                .when("Op", &["|"], &[Bitwise, Or])
                .when("Op", &["^"], &[Bitwise, Xor])
                .when("Op", &["&^"], &[Bitwise, AndNot])
                .when("Op", &["<<"], &[Bitwise, LeftShift])
                .when("Op", &[">>"], &[Bitwise, RightShift])
                .when("Op", &["&&"], &[Boolean, And])
                .when("Op", &["||"], &[Boolean, Or])
                .when("Op", &["=="], &[Relational, Equal])
                .when("Op", &["!="], &[Relational, Not, Equal])
                .when("Op", &["<"], &[Relational, LessThan])
                .when("Op", &["<="], &[Relational, LessThanOrEqual])
                .when("Op", &[">"], &[Relational, GreaterThan])
                .when("Op", &[">="], &[Relational, GreaterThanOrEqual]),
        );

        // Types
        set.add(
            on("ArrayType")
                .roles(&[Type, List])
                .child("Elt", &[Type]),
        );
        set.add(on("StructType").roles(&[Type, Struct]));
        set.add(
            on("FuncType")
                .roles(&[Type, Function])
                .child("Params", &[Argument])
                .child("Results", &[Return]),
        );
        set.add(on("InterfaceType").roles(&[Type, Interface]));
        set.add(
            on("MapType")
                .roles(&[Type, Map])
                .child("Key", &[Key])
                .child("Value", &[Value]),
        );
        set.add(
            on("ChanType")
                .roles(&[Type, Channel])
                .child("Value", &[Value]),
        );
        set.add(on("FieldList").roles(&[List]));
        set.add(
            on("Field")
                .roles(&[Variable])
                .child("Names", &[Name])
                .child("Type", &[Type])
                .child("Tag", &[Annotation]),
        );

        // Simple statements
        set.add(on("DeclStmt").roles(&[Statement, Declaration]));
        set.add(on("EmptyStmt").roles(&[Statement, Noop]));
        set.add(
            on("LabeledStmt")
                .roles(&[Statement, Label])
                .child("Label", &[Label, Name]),
        );
        set.add(on("ExprStmt").roles(&[Statement]));
        set.add(
            on("SendStmt")
                .roles(&[Statement, Channel, Send])
                .child("Chan", &[Channel])
                .child("Value", &[Value]),
        );
        set.add(
            on("IncDecStmt")
                .roles(&[Statement, Unary, Arithmetic])
                .when("Tok", &["++"], &[Increment])
                .when("Tok", &["--"], &[Decrement]),
        );
        set.add(
            on("AssignStmt")
                .roles(&[Statement, Assignment])
                .child("Lhs", &[Assignment, Left])
                .child("Rhs", &[Assignment, Right])
                .when("Tok", &[":="], &[Declaration])
                .when("Tok", &["+=", "-=", "*=", "/=", "%="], &[Operator, Arithmetic])
                .when(
                    "Tok",
                    &["&=", "|=", "^=", "<<=", ">>=", "&^="],
                    &[Operator, Bitwise],
                ),
        );
        set.add(on("GoStmt").roles(&[Statement, Call, Async]));
        set.add(on("DeferStmt").roles(&[Statement, Call, Defer]));
        set.add(
            on("ReturnStmt")
                .roles(&[Statement, Return])
                .child("Results", &[Return, Value]),
        );
        set.add(
            on("BranchStmt")
                .roles(&[Statement])
                .when("Tok", &["break"], &[Break])
                .when("Tok", &["continue"], &[Continue])
                .when("Tok", &["goto"], &[Goto])
                .when("Tok", &["fallthrough"], &[Fallthrough])
                .child("Label", &[Label]),
        );

        // Compound statements
        set.add(on("BlockStmt").roles(&[Statement, Block, Scope]));
        set.add(
            on("IfStmt")
                .roles(&[Statement, If])
                .child("Init", &[If, Initialization])
                .child("Cond", &[If, Condition])
                .child("Body", &[Then, Body])
                .child("Else", &[Else]),
        );
        set.add(
            on("CaseClause")
                .roles(&[Case])
                .child("List", &[Case, Condition])
                .child("Body", &[Case, Body]),
        );
        set.add(
            on("SwitchStmt")
                .roles(&[Statement, Switch])
                .child("Init", &[Switch, Initialization])
                .child("Tag", &[Switch, Value])
                .child("Body", &[Switch, Body]),
        );
        set.add(
            on("TypeSwitchStmt")
                .roles(&[Statement, Switch, Type])
                .child("Init", &[Switch, Initialization])
                .child("Assign", &[Switch, Value])
                .child("Body", &[Switch, Body]),
        );
        set.add(
            on("CommClause")
                .roles(&[Case, Channel])
                .child("Comm", &[Case, Condition])
                .child("Body", &[Case, Body]),
        );
        set.add(
            on("SelectStmt")
                .roles(&[Statement, Select, Channel])
                .child("Body", &[Select, Body]),
        );
        set.add(
            on("ForStmt")
                .roles(&[Statement, For])
                .child("Init", &[For, Initialization])
                .child("Cond", &[For, Condition])
                .child("Post", &[For, Update])
                .child("Body", &[For, Body]),
        );
        set.add(
            on("RangeStmt")
                .roles(&[Statement, For, Range, Iterator])
                .child("Key", &[Iterator, Key])
                .child("Value", &[Iterator, Value])
                .child("X", &[Range, Value])
                .child("Body", &[For, Body]),
        );

        // Declarations
        set.add(
            on("ImportSpec")
                .roles(&[Declaration, Import])
                .child("Name", &[Import, Alias])
                .child("Path", &[Import, Pathname]),
        );
        set.add(
            on("ValueSpec")
                .roles(&[Declaration])
                .child("Names", &[Name])
                .child("Type", &[Type])
                .child("Values", &[Value]),
        );
        set.add(
            on("TypeSpec")
                .roles(&[Declaration, Type])
                .child("Name", &[Type, Name])
                .child("Type", &[Type]),
        );
        set.add(
            on("GenDecl")
                .roles(&[Declaration])
                .when("Tok", &["import"], &[Import])
                .when("Tok", &["const"], &[Constant])
                .when("Tok", &["var"], &[Variable])
                .when("Tok", &["type"], &[Type]),
        );
        set.add(
            on("FuncDecl")
                .roles(&[Declaration, Function])
                .child("Doc", &[Documentation])
                .child("Recv", &[Function, Receiver])
                .child("Name", &[Function, Name])
                .child("Type", &[Function, Type])
                .child("Body", &[Function, Body]),
        );

        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_rule_targets_a_go_type() {
        let set = RuleSet::go();
        let names: Vec<_> = ast::descriptors().into_iter().map(|d| d.name).collect();
        let mut covered = 0;
        for name in &names {
            for rule in set.rules_for(name) {
                assert_eq!(rule.type_name(), *name);
                covered += 1;
            }
        }
        assert_eq!(covered, set.len(), "a rule names a type that is not a Go node");
    }

    #[test]
    fn test_bad_nodes_have_no_rules() {
        let set = RuleSet::go();
        for name in ["BadExpr", "BadStmt", "BadDecl"] {
            assert!(set.rules_for(name).is_empty());
        }
    }
}
