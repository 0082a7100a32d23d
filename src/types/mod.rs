pub use match_pair::MatchPair;
pub use match_table::MatchTable;
pub use model::Model;
pub use point_matrix::PointMatrix;
pub use problem_type::ProblemType;
pub use score::Score;

pub mod match_pair;
pub mod match_table;
pub mod model;
pub mod point_matrix;
pub mod problem_type;
pub mod score;
