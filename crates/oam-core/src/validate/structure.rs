use std::collections::HashMap;

use crate::diagnostics::{Diagnostic, Location, RuleId};
use crate::parse::security::{SecurityRequirement, referenced_schemes};
use crate::transform::name_normalizer::route_to_name;

use super::{OperationView, RuleContext, is_path_parameter, template_parameters};

fn at(view: &OperationView<'_>) -> Location {
    Location::operation(view.path, view.method)
}

pub(super) fn missing_openapi_version(ctx: &RuleContext<'_>, out: &mut Vec<Diagnostic>) {
    if ctx.document.openapi.as_deref().is_none_or(str::is_empty) {
        out.push(Diagnostic::new(
            RuleId::MissingOpenApiVersion,
            Location::Document,
            "document does not declare an `openapi` version",
        ));
    }
}

pub(super) fn missing_info(ctx: &RuleContext<'_>, out: &mut Vec<Diagnostic>) {
    if ctx.document.info.is_none() {
        out.push(Diagnostic::new(
            RuleId::MissingInfo,
            Location::Document,
            "document has no `info` object",
        ));
    }
}

pub(super) fn missing_operation_id(ctx: &RuleContext<'_>, out: &mut Vec<Diagnostic>) {
    for view in ctx.operations() {
        if view.operation.operation_id.as_deref().is_none_or(str::is_empty) {
            out.push(Diagnostic::new(
                RuleId::MissingOperationId,
                at(&view),
                format!(
                    "operation has no operationId (suggested: {})",
                    route_to_name(view.method, view.path)
                ),
            ));
        }
    }
}

pub(super) fn duplicate_operation_id(ctx: &RuleContext<'_>, out: &mut Vec<Diagnostic>) {
    let mut first_use: HashMap<&str, OperationView<'_>> = HashMap::new();
    for view in ctx.operations() {
        let Some(id) = view.operation.operation_id.as_deref() else {
            continue;
        };
        match first_use.get(id) {
            Some(first) => out.push(Diagnostic::new(
                RuleId::DuplicateOperationId,
                at(&view),
                format!(
                    "operationId '{id}' is already used by {} {}",
                    first.method, first.path
                ),
            )),
            None => {
                first_use.insert(id, view);
            }
        }
    }
}

pub(super) fn undeclared_path_parameter(ctx: &RuleContext<'_>, out: &mut Vec<Diagnostic>) {
    for view in ctx.operations() {
        let params = ctx.effective_parameters(&view);
        for name in template_parameters(view.path) {
            let declared = params
                .iter()
                .any(|p| is_path_parameter(p) && p.name == name);
            if !declared {
                out.push(Diagnostic::new(
                    RuleId::UndeclaredPathParameter,
                    at(&view),
                    format!("path parameter '{name}' is not declared"),
                ));
            }
        }
    }
}

pub(super) fn unused_path_parameter(ctx: &RuleContext<'_>, out: &mut Vec<Diagnostic>) {
    for view in ctx.operations() {
        let template = template_parameters(view.path);
        for param in ctx.effective_parameters(&view) {
            if is_path_parameter(param) && !template.contains(&param.name.as_str()) {
                out.push(Diagnostic::new(
                    RuleId::UnusedPathParameter,
                    at(&view),
                    format!("path parameter '{}' does not appear in the path", param.name),
                ));
            }
        }
    }
}

pub(super) fn optional_path_parameter(ctx: &RuleContext<'_>, out: &mut Vec<Diagnostic>) {
    for view in ctx.operations() {
        for param in ctx.effective_parameters(&view) {
            if is_path_parameter(param) && !param.required {
                out.push(Diagnostic::new(
                    RuleId::OptionalPathParameter,
                    at(&view),
                    format!("path parameter '{}' must be required", param.name),
                ));
            }
        }
    }
}

/// Same name and location twice within one parameter list.
pub(super) fn duplicate_parameter(ctx: &RuleContext<'_>, out: &mut Vec<Diagnostic>) {
    for view in ctx.operations() {
        for list in [&view.item.parameters, &view.operation.parameters] {
            let mut seen = Vec::new();
            for param in list.iter().filter_map(|p| ctx.parameter(p)) {
                let key = param.key();
                if seen.contains(&key) {
                    out.push(Diagnostic::new(
                        RuleId::DuplicateParameter,
                        at(&view),
                        format!("{} parameter '{}' is declared twice", param.location, param.name),
                    ));
                } else {
                    seen.push(key);
                }
            }
        }
    }
}

pub(super) fn empty_responses(ctx: &RuleContext<'_>, out: &mut Vec<Diagnostic>) {
    for view in ctx.operations() {
        if view.operation.responses.is_empty() {
            out.push(Diagnostic::new(
                RuleId::EmptyResponses,
                at(&view),
                "operation declares no responses",
            ));
        }
    }
}

pub(super) fn undefined_security_scheme(ctx: &RuleContext<'_>, out: &mut Vec<Diagnostic>) {
    let schemes = ctx.document.components.as_ref().map(|c| &c.security_schemes);
    let is_defined = |name: &str| schemes.is_some_and(|s| s.contains_key(name));
    let mut check = |requirements: &[SecurityRequirement], location: &Location| {
        for name in referenced_schemes(requirements) {
            if !is_defined(name) {
                out.push(Diagnostic::new(
                    RuleId::UndefinedSecurityScheme,
                    location.clone(),
                    format!("security scheme '{name}' is not defined in components"),
                ));
            }
        }
    };

    if let Some(global) = &ctx.document.security {
        check(global, &Location::Document);
    }
    for view in ctx.operations() {
        if let Some(local) = &view.operation.security {
            check(local, &at(&view));
        }
    }
}

pub(super) fn missing_success_response(ctx: &RuleContext<'_>, out: &mut Vec<Diagnostic>) {
    for view in ctx.operations() {
        let responses = &view.operation.responses;
        if responses.is_empty() {
            continue;
        }
        let has_success = responses
            .keys()
            .any(|code| code.starts_with('2') || code.eq_ignore_ascii_case("default"));
        if !has_success {
            out.push(Diagnostic::new(
                RuleId::MissingSuccessResponse,
                at(&view),
                "operation declares no 2xx response",
            ));
        }
    }
}

pub(super) fn missing_description(ctx: &RuleContext<'_>, out: &mut Vec<Diagnostic>) {
    for view in ctx.operations() {
        let op = view.operation;
        let blank = |s: &Option<String>| s.as_deref().is_none_or(|t| t.trim().is_empty());
        if blank(&op.summary) && blank(&op.description) {
            out.push(Diagnostic::new(
                RuleId::MissingOperationDescription,
                at(&view),
                "operation has neither a summary nor a description",
            ));
        }
    }
}
