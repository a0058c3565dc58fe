use crate::error::PlannerError;
use planner_domain::ID;

pub struct Guard {}

impl Guard {
    pub fn against_malformed_id(val: &str) -> Result<ID, PlannerError> {
        val.parse()
            .map_err(|e| PlannerError::BadClientData(format!("{}", e)))
    }
}
