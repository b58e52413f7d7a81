mod assignments;
pub use assignments::Assignments;

mod delete;
pub use delete::Delete;

mod expr;
pub use expr::Expr;

mod expr_binary_op;
pub use expr_binary_op::{BinaryOp, ExprBinaryOp};

mod expr_column;
pub use expr_column::ExprColumn;

mod expr_in_list;
pub use expr_in_list::ExprInList;

mod expr_is_null;
pub use expr_is_null::ExprIsNull;

mod expr_raw;
pub use expr_raw::ExprRaw;

mod insert;
pub use insert::Insert;

mod order_by;
pub use order_by::{Direction, OrderBy};

mod select;
pub use select::{Returning, Select, SelectItem};

mod statement;
pub use statement::Statement;

mod update;
pub use update::Update;

mod value;
pub use value::Value;

mod value_record;
pub use value_record::ValueRecord;

mod value_set;
pub use value_set::ValueSet;
