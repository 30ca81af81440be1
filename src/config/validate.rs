// src/config/validate.rs

use std::collections::HashSet;

use crate::config::model::{PlanFile, RawPlanFile};
use crate::delay::Delay;
use crate::errors::{Result, WavedagError};
use crate::plan::StageId;
use crate::types::ExecutionMode;

impl TryFrom<RawPlanFile> for PlanFile {
    type Error = WavedagError;

    fn try_from(raw: RawPlanFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_plan(&raw)?;
        Ok(PlanFile::new_unchecked(raw.plan, raw.defaults, raw.stage, raw.link))
    }
}

fn validate_raw_plan(raw: &RawPlanFile) -> Result<()> {
    ensure_has_stages(raw)?;
    let ids = unique_stage_ids(raw)?;
    validate_links(raw, &ids)?;
    validate_start_set(raw, &ids)?;
    validate_scripts(raw)?;
    validate_delays(raw)?;
    Ok(())
}

fn ensure_has_stages(raw: &RawPlanFile) -> Result<()> {
    if raw.stage.is_empty() {
        return Err(WavedagError::ConfigError(
            "plan must contain at least one [[stage]] entry".to_string(),
        ));
    }
    Ok(())
}

fn unique_stage_ids(raw: &RawPlanFile) -> Result<HashSet<StageId>> {
    let mut ids = HashSet::new();
    for stage in raw.stage.iter() {
        if !ids.insert(stage.id) {
            return Err(WavedagError::ConfigError(format!(
                "stage id {} is defined more than once",
                stage.id
            )));
        }
    }
    Ok(ids)
}

fn validate_links(raw: &RawPlanFile, ids: &HashSet<StageId>) -> Result<()> {
    for link in raw.link.iter() {
        for endpoint in [link.from, link.to] {
            if !ids.contains(&endpoint) {
                return Err(WavedagError::ConfigError(format!(
                    "link {} -> {} references unknown stage {}",
                    link.from, link.to, endpoint
                )));
            }
        }
    }
    Ok(())
}

fn validate_start_set(raw: &RawPlanFile, ids: &HashSet<StageId>) -> Result<()> {
    for id in raw.plan.start.iter() {
        if !ids.contains(id) {
            return Err(WavedagError::ConfigError(format!(
                "[plan].start references unknown stage {id}"
            )));
        }
    }

    if raw.plan.start.is_empty() {
        let targets: HashSet<StageId> = raw.link.iter().map(|l| l.to).collect();
        if raw.stage.iter().all(|s| targets.contains(&s.id)) {
            return Err(WavedagError::ConfigError(
                "every stage has an incoming link; set [plan].start explicitly".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_scripts(raw: &RawPlanFile) -> Result<()> {
    for stage in raw.stage.iter() {
        if stage.script.mode == ExecutionMode::Deferred && stage.script.ticks == 0 {
            return Err(WavedagError::ConfigError(format!(
                "stage {}: deferred script must have ticks >= 1 (got 0)",
                stage.id
            )));
        }
    }
    Ok(())
}

fn is_negative(delay: &Delay) -> bool {
    delay
        .steps()
        .iter()
        .any(|o| o.years < 0 || o.months < 0 || o.days < 0)
}

/// Delays only ever push a task later; a negative offset is a typo.
fn validate_delays(raw: &RawPlanFile) -> Result<()> {
    for stage in raw.stage.iter() {
        if is_negative(&stage.delay) {
            return Err(WavedagError::ConfigError(format!(
                "stage {}: delay must not be negative",
                stage.id
            )));
        }
    }
    for link in raw.link.iter() {
        if is_negative(&link.delay) {
            return Err(WavedagError::ConfigError(format!(
                "link {} -> {}: delay must not be negative",
                link.from, link.to
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Result<PlanFile> {
        let raw: RawPlanFile = toml::from_str(src)?;
        PlanFile::try_from(raw)
    }

    fn config_error(src: &str) -> String {
        match parse(src) {
            Err(WavedagError::ConfigError(msg)) => msg,
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn minimal_plan_is_valid() {
        let plan = parse(
            r#"
            [[stage]]
            id = 1
            kind = "start"
            "#,
        )
        .unwrap();
        assert_eq!(plan.title(), "plan");
        assert_eq!(plan.defaults.max_forks_per_stage, 1);
        assert_eq!(plan.build_plan().unwrap().start_ids(), &[1]);
    }

    #[test]
    fn rejects_empty_plan() {
        assert!(config_error("").contains("at least one"));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let msg = config_error(
            r#"
            [[stage]]
            id = 1
            kind = "start"
            [[stage]]
            id = 1
            kind = "end"
            "#,
        );
        assert!(msg.contains("more than once"));
    }

    #[test]
    fn rejects_unknown_link_endpoint() {
        let msg = config_error(
            r#"
            [[stage]]
            id = 1
            kind = "start"
            [[link]]
            from = 1
            to = 7
            "#,
        );
        assert!(msg.contains("unknown stage 7"));
    }

    #[test]
    fn rejects_plans_without_start() {
        let msg = config_error(
            r#"
            [[stage]]
            id = 1
            kind = "start"
            [[stage]]
            id = 2
            kind = "end"
            [[link]]
            from = 1
            to = 2
            [[link]]
            from = 2
            to = 1
            "#,
        );
        assert!(msg.contains("[plan].start"));

        let unknown = config_error(
            r#"
            [plan]
            start = [3]
            [[stage]]
            id = 1
            kind = "start"
            "#,
        );
        assert!(unknown.contains("unknown stage 3"));
    }

    #[test]
    fn rejects_deferred_script_without_ticks() {
        let msg = config_error(
            r#"
            [[stage]]
            id = 1
            kind = "start"
            script = { mode = "deferred", ticks = 0 }
            "#,
        );
        assert!(msg.contains("ticks >= 1"));
    }

    #[test]
    fn rejects_negative_delays() {
        let msg = config_error(
            r#"
            [[stage]]
            id = 1
            kind = "start"
            delay = { days = -3 }
            "#,
        );
        assert!(msg.contains("stage 1: delay must not be negative"));

        let msg = config_error(
            r#"
            [[stage]]
            id = 1
            kind = "start"
            [[stage]]
            id = 2
            kind = "end"
            [[link]]
            from = 1
            to = 2
            delay = { months = 1, days = -1 }
            "#,
        );
        assert!(msg.contains("link 1 -> 2"));
    }

    #[test]
    fn unknown_fields_are_toml_errors() {
        let err = parse(
            r#"
            [[stage]]
            id = 1
            kind = "start"
            colour = "blue"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, WavedagError::TomlError(_)));
    }
}
