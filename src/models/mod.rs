// Model exports
pub mod domain;
pub mod outputs;

pub use domain::{
    AfterParty, EventConfig, Group, MealSchedule, MealType, Participant, PreferenceGraph,
    RegistrationStatus, Route, RouteStop, TimeWindow,
};
pub use outputs::{FormationResult, RoutingResult};
