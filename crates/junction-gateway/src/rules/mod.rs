//! Rule configuration: the data model pushed by the authoring layer and
//! the atomically swapped compiled snapshot the dispatcher reads.

mod store;
mod types;

pub use store::{CompiledRuleSet, RuleStore};
pub use types::{
    Condition, ConditionGroup, ConditionNode, ConditionOperator, DatamapEntry, EgressTransform,
    GroupKind, IncomingAuth, IncomingRoute, KeyLocation, Mapping, MockHeader, OutgoingAuth,
    OutgoingRoute, ResponseMode, RouteMethod, RuleSet, TransformAction,
};
