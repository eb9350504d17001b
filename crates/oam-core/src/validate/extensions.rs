use crate::diagnostics::{Diagnostic, Location, RuleId};
use crate::parse::extensions::Extension;

use super::RuleContext;

fn shape_error<T>(key: &str, ext: Option<&Extension<T>>, location: Location, out: &mut Vec<Diagnostic>) {
    if let Some(error) = ext.and_then(Extension::error) {
        out.push(Diagnostic::new(
            RuleId::InvalidExtension,
            location,
            format!("{key} is malformed: {error}"),
        ));
    }
}

pub(super) fn invalid_extension(ctx: &RuleContext<'_>, out: &mut Vec<Diagnostic>) {
    shape_error("x-rate-limit", ctx.document.rate_limit.as_ref(), Location::Document, out);
    for view in ctx.operations() {
        let op = view.operation;
        let at = || Location::operation(view.path, view.method);
        shape_error("x-rate-limit", op.rate_limit.as_ref(), at(), out);
        shape_error("x-cache", op.cache.as_ref(), at(), out);
        shape_error("x-retry", op.retry.as_ref(), at(), out);
    }
}

pub(super) fn cache_on_unsafe_method(ctx: &RuleContext<'_>, out: &mut Vec<Diagnostic>) {
    for view in ctx.operations() {
        if view.operation.cache.is_some() && !view.method.is_safe() {
            out.push(Diagnostic::new(
                RuleId::CacheOnUnsafeMethod,
                Location::operation(view.path, view.method),
                format!("x-cache has no effect on {} requests", view.method),
            ));
        }
    }
}

pub(super) fn retry_on_non_idempotent_method(ctx: &RuleContext<'_>, out: &mut Vec<Diagnostic>) {
    for view in ctx.operations() {
        if view.operation.retry.is_some() && !view.method.is_idempotent() {
            out.push(Diagnostic::new(
                RuleId::RetryOnNonIdempotentMethod,
                Location::operation(view.path, view.method),
                format!("x-retry on {} may repeat side effects", view.method),
            ));
        }
    }
}
