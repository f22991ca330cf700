//! Extended query flow.
//!
//! Every binding is executed through its own portal: `Bind`, `Describe`, `Execute` and `Close`,
//! with a single `Sync` after the last binding.
//!
//! <https://www.postgresql.org/docs/current/protocol-flow.html#PROTOCOL-FLOW-EXT-QUERY>
use std::sync::{Arc, atomic::AtomicU64};

use super::Results;
use crate::{
    Result,
    client::Client,
    codec::{Codecs, Parameter},
    common::verbose,
    postgres::{
        BackendMessage, Oid, Request,
        frontend::{Bind, Close, Describe, Execute, Sync, Target},
    },
    statement::{PortalName, StatementCache},
};

/// Closing the portal ends the messages of one binding.
fn is_portal_closed(message: &BackendMessage) -> bool {
    matches!(message, BackendMessage::CloseComplete(_))
}

/// Execute the prepared `sql` once per binding.
pub(crate) async fn execute<C>(
    client: &C,
    cache: &StatementCache,
    portals: &AtomicU64,
    codecs: Arc<Codecs>,
    sql: &str,
    bindings: &[Vec<Parameter>],
) -> Result<Results>
where
    C: Client + ?Sized,
{
    let mut request = Request::new();

    for params in bindings {
        let types: Vec<Oid> = params.iter().map(|param| param.oid).collect();
        let statement = cache.get_name(client, sql, &types).await?;
        let portal = PortalName::next(portals);
        verbose!(%statement, %portal, params = params.len(), "Bind");

        request
            .push(Bind {
                portal_name: portal.as_str(),
                stmt_name: statement.as_str(),
                params,
                result_formats: &[],
            })
            .push(Describe { target: Target::Portal, name: portal.as_str() })
            .push(Execute { portal_name: portal.as_str(), max_row: 0 })
            .push(Close { target: Target::Portal, name: portal.as_str() });
    }

    request.push(Sync);

    Ok(Results::new(client.exchange(request), is_portal_closed, codecs))
}
