use crate::config::CasingPolicy;
use crate::diagnostics::{Diagnostic, Location, RuleId};
use crate::parse::parameter::{Parameter, ParameterLocation};
use crate::parse::ref_resolve::encode_pointer_segment;
use crate::transform::name_normalizer::{follows_casing, to_casing};

use super::RuleContext;

fn casing_message(kind: &str, name: &str, policy: CasingPolicy) -> String {
    format!(
        "{kind} '{name}' is not {} (expected '{}')",
        policy.label(),
        to_casing(name, policy)
    )
}

pub(super) fn operation_id_casing(ctx: &RuleContext<'_>, out: &mut Vec<Diagnostic>) {
    let policy = ctx.config.naming.operation_id;
    for view in ctx.operations() {
        let Some(id) = view.operation.operation_id.as_deref() else {
            continue;
        };
        if !id.is_empty() && !follows_casing(id, policy) {
            out.push(Diagnostic::new(
                RuleId::OperationIdCasing,
                Location::operation(view.path, view.method),
                casing_message("operationId", id, policy),
            ));
        }
    }
}

pub(super) fn schema_name_casing(ctx: &RuleContext<'_>, out: &mut Vec<Diagnostic>) {
    let policy = ctx.config.naming.schema;
    let Some(components) = &ctx.document.components else {
        return;
    };
    for name in components.schemas.keys() {
        if !follows_casing(name, policy) {
            out.push(Diagnostic::new(
                RuleId::SchemaNameCasing,
                Location::schema(name),
                casing_message("schema", name, policy),
            ));
        }
    }
}

pub(super) fn property_name_casing(ctx: &RuleContext<'_>, out: &mut Vec<Diagnostic>) {
    let policy = ctx.config.naming.property;
    for site in ctx.component_schemas() {
        for name in site.schema.properties.keys() {
            if follows_casing(name, policy) {
                continue;
            }
            let path = if site.path.is_empty() {
                name.clone()
            } else {
                format!("{}.{name}", site.path)
            };
            out.push(Diagnostic::new(
                RuleId::PropertyNameCasing,
                Location::property(site.component, &path),
                casing_message("property", name, policy),
            ));
        }
    }
}

/// Header names follow HTTP conventions and are not checked.
pub(super) fn parameter_name_casing(ctx: &RuleContext<'_>, out: &mut Vec<Diagnostic>) {
    let policy = ctx.config.naming.parameter;
    let checked = |p: &Parameter| p.location != ParameterLocation::Header && !follows_casing(&p.name, policy);

    for view in ctx.operations() {
        for param in ctx.effective_parameters(&view) {
            if checked(param) {
                out.push(Diagnostic::new(
                    RuleId::ParameterNameCasing,
                    Location::operation(view.path, view.method),
                    casing_message(&format!("{} parameter", param.location), &param.name, policy),
                ));
            }
        }
    }
    if let Some(components) = &ctx.document.components {
        for (key, item) in &components.parameters {
            let Some(param) = ctx.parameter(item) else {
                continue;
            };
            if checked(param) {
                out.push(Diagnostic::new(
                    RuleId::ParameterNameCasing,
                    Location::pointer(format!(
                        "#/components/parameters/{}",
                        encode_pointer_segment(key)
                    )),
                    casing_message(&format!("{} parameter", param.location), &param.name, policy),
                ));
            }
        }
    }
}

pub(super) fn enum_value_casing(ctx: &RuleContext<'_>, out: &mut Vec<Diagnostic>) {
    let policy = ctx.config.naming.enum_value;
    if policy == CasingPolicy::Any {
        return;
    }
    for site in ctx.component_schemas() {
        for value in site.schema.enum_values.iter().filter_map(|v| v.as_str()) {
            if follows_casing(value, policy) {
                continue;
            }
            let location = if site.path.is_empty() {
                Location::schema(site.component)
            } else {
                Location::property(site.component, &site.path)
            };
            out.push(Diagnostic::new(
                RuleId::EnumValueCasing,
                location,
                casing_message("enum value", value, policy),
            ));
        }
    }
}
