//! Text classification for crisis messages.
//!
//! The training path is: tokenize and TF-IDF-vectorize the message text,
//! grid-search vectorizer hyperparameters with k-fold cross-validation,
//! fit one random forest per category on the winning configuration, and
//! score the result on a held-out split. The fitted pieces serialize into
//! a single [`model::ModelArtifact`] JSON file.

pub mod forest;
pub mod metrics;
pub mod model;
pub mod search;
pub mod sparse;
pub mod split;
pub mod tokenize;
pub mod tree;
pub mod vectorize;

pub use forest::{ForestParams, MultiOutputForest, RandomForest};
pub use metrics::{macro_f1, ClassificationReport, ConfusionCounts, LabelReport};
pub use model::{ModelArtifact, ARTIFACT_VERSION};
pub use search::{CandidateScore, GridSearch, ParamGrid, SearchOutcome};
pub use split::{train_test_split, KFold, SplitIndices};
pub use tokenize::tokenize;
pub use tree::{DecisionTree, TreeParams};
pub use vectorize::{TfidfVectorizer, VectorizerParams};
