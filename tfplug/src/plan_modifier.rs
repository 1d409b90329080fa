use crate::schema::{PlanModifier, PlanModifierRequest, PlanModifierResponse};

/// Forces a replace whenever the planned value differs from state
pub struct RequiresReplace;

impl PlanModifier for RequiresReplace {
    fn description(&self) -> String {
        "changing this value forces replacement".to_string()
    }

    fn modify(&self, request: PlanModifierRequest<'_>) -> PlanModifierResponse {
        // Creates never replace, and unknowns are resolved at apply.
        let requires_replace = request.has_prior_state
            && !request.plan_value.is_unknown()
            && !request.state_value.is_unknown()
            && request.state_value != &request.plan_value;

        PlanModifierResponse {
            plan_value: request.plan_value,
            requires_replace,
            diagnostics: Vec::new(),
        }
    }
}

/// Carries the prior state value forward for computed attributes
/// instead of showing them as "known after apply"
pub struct UseStateForUnknown;

impl PlanModifier for UseStateForUnknown {
    fn description(&self) -> String {
        "once set, the value is preserved from state".to_string()
    }

    fn modify(&self, request: PlanModifierRequest<'_>) -> PlanModifierResponse {
        let keep_state = request.plan_value.is_unknown()
            && !request.config_value.is_known()
            && !request.state_value.is_null();

        if keep_state {
            PlanModifierResponse::keep(request.state_value.clone())
        } else {
            PlanModifierResponse::keep(request.plan_value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AttributePath, Dynamic};

    fn request<'a>(
        path: &'a AttributePath,
        config: &'a Dynamic,
        state: &'a Dynamic,
        plan: Dynamic,
        has_prior_state: bool,
    ) -> PlanModifierRequest<'a> {
        PlanModifierRequest {
            config_value: config,
            state_value: state,
            plan_value: plan,
            path,
            has_prior_state,
        }
    }

    #[test]
    fn requires_replace_on_change() {
        let path = AttributePath::new("type");
        let config = Dynamic::string("production");
        let state = Dynamic::string("development");
        let response = RequiresReplace.modify(request(
            &path,
            &config,
            &state,
            Dynamic::string("production"),
            true,
        ));
        assert!(response.requires_replace);
    }

    #[test]
    fn requires_replace_skips_create_and_unchanged() {
        let path = AttributePath::new("type");
        let value = Dynamic::string("development");
        let on_create =
            RequiresReplace.modify(request(&path, &value, &Dynamic::Null, value.clone(), false));
        assert!(!on_create.requires_replace);

        let unchanged = RequiresReplace.modify(request(&path, &value, &value, value.clone(), true));
        assert!(!unchanged.requires_replace);
    }

    #[test]
    fn requires_replace_waits_for_unknown() {
        let path = AttributePath::new("environment_id");
        let state = Dynamic::string("env_1");
        let response = RequiresReplace.modify(request(
            &path,
            &Dynamic::Unknown,
            &state,
            Dynamic::Unknown,
            true,
        ));
        assert!(!response.requires_replace);
    }

    #[test]
    fn use_state_for_unknown_copies_state() {
        let path = AttributePath::new("id");
        let state = Dynamic::string("env_123");
        let response = UseStateForUnknown.modify(request(
            &path,
            &Dynamic::Null,
            &state,
            Dynamic::Unknown,
            true,
        ));
        assert_eq!(response.plan_value, Dynamic::string("env_123"));
    }

    #[test]
    fn use_state_for_unknown_leaves_create_unknown() {
        let path = AttributePath::new("id");
        let response = UseStateForUnknown.modify(request(
            &path,
            &Dynamic::Null,
            &Dynamic::Null,
            Dynamic::Unknown,
            false,
        ));
        assert!(response.plan_value.is_unknown());
    }
}
