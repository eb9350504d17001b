use crate::diagnostics::{Diagnostic, Location, RuleId};
use crate::parse::operation::HttpMethod;
use crate::parse::security::requires_credentials;

use super::{OperationView, RuleContext, template_parameters};

/// `default`, a concrete code in 100..=599, or a range such as `4XX`.
fn is_valid_status(code: &str) -> bool {
    if code == "default" {
        return true;
    }
    let bytes = code.as_bytes();
    if bytes.len() != 3 || !(b'1'..=b'5').contains(&bytes[0]) {
        return false;
    }
    let rest = &bytes[1..];
    rest.iter().all(u8::is_ascii_digit) || rest.iter().all(|b| b.eq_ignore_ascii_case(&b'X'))
}

fn declares(view: &OperationView<'_>, status: &str) -> bool {
    view.operation.responses.contains_key(status)
}

fn is_secured(ctx: &RuleContext<'_>, view: &OperationView<'_>) -> bool {
    requires_credentials(ctx.effective_security(view.operation))
}

pub(super) fn invalid_status_code(ctx: &RuleContext<'_>, out: &mut Vec<Diagnostic>) {
    for view in ctx.operations() {
        for code in view.operation.responses.keys() {
            if !is_valid_status(code) {
                out.push(Diagnostic::new(
                    RuleId::InvalidStatusCode,
                    Location::operation(view.path, view.method),
                    format!("'{code}' is not a valid HTTP status code"),
                ));
            }
        }
    }
}

/// A POST that creates under a fixed collection has nothing to look up.
pub(super) fn not_found_without_path_parameter(ctx: &RuleContext<'_>, out: &mut Vec<Diagnostic>) {
    for view in ctx.operations() {
        if view.method == HttpMethod::Post
            && declares(&view, "404")
            && template_parameters(view.path).is_empty()
        {
            out.push(Diagnostic::new(
                RuleId::NotFoundWithoutPathParameter,
                Location::operation(view.path, view.method),
                "404 declared on a POST whose path has no parameters",
            ));
        }
    }
}

pub(super) fn too_many_requests_without_rate_limit(
    ctx: &RuleContext<'_>,
    out: &mut Vec<Diagnostic>,
) {
    let global = ctx.document.rate_limit.is_some();
    for view in ctx.operations() {
        if declares(&view, "429") && !global && view.operation.rate_limit.is_none() {
            out.push(Diagnostic::new(
                RuleId::TooManyRequestsWithoutRateLimit,
                Location::operation(view.path, view.method),
                "429 declared but no x-rate-limit is configured",
            ));
        }
    }
}

fn status_without_security(
    ctx: &RuleContext<'_>,
    out: &mut Vec<Diagnostic>,
    status: &str,
    rule: RuleId,
) {
    for view in ctx.operations() {
        if declares(&view, status) && !is_secured(ctx, &view) {
            out.push(Diagnostic::new(
                rule,
                Location::operation(view.path, view.method),
                format!("{status} declared but no security requirement applies"),
            ));
        }
    }
}

pub(super) fn unauthorized_without_security(ctx: &RuleContext<'_>, out: &mut Vec<Diagnostic>) {
    status_without_security(ctx, out, "401", RuleId::UnauthorizedWithoutSecurity);
}

pub(super) fn forbidden_without_security(ctx: &RuleContext<'_>, out: &mut Vec<Diagnostic>) {
    status_without_security(ctx, out, "403", RuleId::ForbiddenWithoutSecurity);
}

pub(super) fn no_content_with_body(ctx: &RuleContext<'_>, out: &mut Vec<Diagnostic>) {
    for view in ctx.operations() {
        let Some(response) = ctx.response(view.operation, "204") else {
            continue;
        };
        if response.has_body() {
            out.push(Diagnostic::new(
                RuleId::NoContentWithBody,
                Location::operation(view.path, view.method),
                "204 response must not declare content",
            ));
        }
    }
}
