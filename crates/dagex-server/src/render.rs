//! HTML pages.

use std::collections::BTreeMap;
use std::fmt::Write;

use cid::Cid;
use dagex_resolver::{DirEntry, DumpNode};
use dagex_retrieval::{ClientDeal, MarketParticipant, SectorInfo, StorageDeal};
use dagex_types::{size_str, DealId, ProviderAddress};

const STYLE: &str = "body{font-family:monospace}table{border-collapse:collapse}\
td{padding:0 .6em;vertical-align:top}.node table{border-left:1px solid #ccc}";

/// Fetches the description of a deferred link with a HEAD request.
const CHECK_DESC: &str = "function checkDesc(el) {\
  fetch(el.dataset.url, {method: 'HEAD'}).then(r => {\
    el.replaceWith(document.createTextNode(r.headers.get('X-Desc') || r.headers.get('Content-Type') || '??'));\
  });\
}";

/// Escape text for use in HTML content and quoted attributes.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Percent-encode everything but RFC 3986 unreserved characters, for use
/// as a path segment or query value.
pub fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => out.push(b as char),
            b => {
                let _ = write!(out, "%{b:02X}");
            }
        }
    }
    out
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{}</title>\
         <style>{STYLE}</style><script>{CHECK_DESC}</script></head><body>{body}</body></html>",
        escape(title)
    )
}

/// `/view/...` to `/car/...`.
pub fn car_path(view_path: &str) -> String {
    match view_path.strip_prefix("/view") {
        Some(rest) => format!("/car{rest}"),
        None => view_path.to_string(),
    }
}

fn join(base: &str, segment: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), segment)
}

/// Link resolving to `url`'s description when clicked. The target sits in a
/// data attribute so names never reach script source.
fn deferred_marker(url: &str, name: &str) -> String {
    format!(
        "<a href=\"javascript:void(0)\" data-url=\"{}?filename={}\" onclick=\"checkDesc(this)\">[?]</a>",
        escape(url),
        percent_encode(name)
    )
}

fn directory_table(url: &str, entries: &[DirEntry]) -> String {
    let mut rows = String::new();
    for (i, entry) in entries.iter().enumerate() {
        let href = join(url, &format!("Links/{i}/Hash"));
        let desc = if entry.desc.is_deferred() {
            deferred_marker(&href, &entry.name)
        } else {
            escape(&entry.desc.to_string())
        };
        let _ = write!(
            rows,
            "<tr><td><a href=\"{href}?filename={query}\">{name}</a></td><td>{size}</td>\
             <td><a href=\"{car}\">[car]</a></td><td>{cid}</td><td>{desc}</td></tr>",
            href = escape(&href),
            query = percent_encode(&entry.name),
            name = escape(&entry.name),
            size = escape(&entry.size),
            car = escape(&car_path(&href)),
            cid = entry.cid,
        );
    }
    format!("<table>{rows}</table>")
}

/// Listing of a directory or shard reached at `url`.
pub fn directory(url: &str, entries: &[DirEntry]) -> String {
    let body = format!(
        "<h3>{}</h3><p><a href=\"{}\">[car]</a></p>{}",
        escape(url),
        escape(&car_path(url)),
        directory_table(url, entries)
    );
    page(url, &body)
}

/// Structural view of non-UnixFS data reached at `url`.
pub fn dump(url: &str, tree: &DumpNode) -> String {
    let body = format!("<h3>{}</h3>{}", escape(url), dump_node(url, tree));
    page(url, &body)
}

fn dump_node(url: &str, node: &DumpNode) -> String {
    match node {
        DumpNode::Map(rows) => {
            let inner: String = rows
                .iter()
                .map(|(key, value)| {
                    format!(
                        "<tr><td><span class=\"node\">\"{}\"</span></td><td>{}</td></tr>",
                        escape(key),
                        dump_node(url, value)
                    )
                })
                .collect();
            format!("<div class=\"node\"><div><span>MAP</span></div><div><table>{inner}</table></div></div>")
        }
        DumpNode::List(items) => {
            let inner: String = items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    format!(
                        "<tr><td class='listkey'>{i}</td><td class='listval'>{}</td></tr>",
                        dump_node(url, item)
                    )
                })
                .collect();
            format!("<div class=\"node\"><div><span>LIST</span></div><div><table>{inner}</table></div></div>")
        }
        DumpNode::Null => "<span class=\"node\">NULL</span>".to_string(),
        DumpNode::Bool(b) => format!("<span class=\"node\">{b}</span>"),
        DumpNode::Integer(i) => format!("<span class=\"node\">{i}</span>"),
        DumpNode::Float(f) => format!("<span class=\"node\">{f:.6}</span>"),
        DumpNode::String(s) => format!("<span class=\"node\">\"{}\"</span>", escape(s)),
        DumpNode::Bytes(b) => format!("<span class=\"node\">{}</span>", hex::encode(b)),
        DumpNode::Link { cid, path, desc } => {
            let segments: Vec<String> = path.iter().map(|s| percent_encode(s)).collect();
            let href = join(url, &segments.join("/"));
            let name = path.last().map(String::as_str).unwrap_or("");
            let mut text = escape(&desc.text);
            if !desc.full {
                text = format!("{text} {}", deferred_marker(&href, name));
            }
            format!(
                "<span class=\"node\"><a href=\"{}\">{cid}</a> <a href=\"{}\">[car]</a> <span>({text})</span></span>",
                escape(&href),
                escape(&car_path(&href)),
            )
        }
        DumpNode::Truncated => "<span class=\"node\">...</span>".to_string(),
    }
}

/// What the deal view learned about the deal's payload root.
#[derive(Clone, Debug)]
pub struct DealSummary {
    pub root: Cid,
    pub kind: String,
    pub size: String,
    /// Number of directory entries, for directory roots.
    pub links: Option<usize>,
    pub entries: Vec<DirEntry>,
}

pub fn deal(deal: &StorageDeal, summary: &DealSummary) -> String {
    let p = &deal.proposal;
    let view = format!("/view/{}/{}/{}", p.provider, p.piece_cid, summary.root);
    let mut body = format!(
        "<h3>Deal {id}</h3><table>\
         <tr><td>Provider</td><td><a href=\"/minersectors/{provider}\">{provider}</a></td></tr>\
         <tr><td>Client</td><td>{client}</td></tr>\
         <tr><td>Piece</td><td>{piece}</td></tr>\
         <tr><td>Piece size</td><td>{piece_size}</td></tr>\
         <tr><td>Verified</td><td>{verified}</td></tr>\
         <tr><td>Epochs</td><td>{start} .. {end}</td></tr>\
         <tr><td>Price / epoch</td><td>{price}</td></tr>\
         <tr><td>Root</td><td><a href=\"{view}\">{root}</a> <a href=\"{car}\">[car]</a></td></tr>\
         <tr><td>Type</td><td>{kind}</td></tr>\
         <tr><td>Size</td><td>{size}</td></tr>",
        id = deal.id,
        provider = escape(p.provider.as_str()),
        client = escape(&p.client),
        piece = p.piece_cid,
        piece_size = size_str(p.piece_size),
        verified = p.verified,
        start = p.start_epoch,
        end = p.end_epoch,
        price = p.storage_price_per_epoch,
        root = summary.root,
        car = escape(&car_path(&view)),
        kind = escape(&summary.kind),
        size = escape(&summary.size),
        view = escape(&view),
    );
    if let Some(links) = summary.links {
        let _ = write!(
            body,
            "<tr><td>Entries</td><td>{links} <a href=\"/deal/{}?expand=1\">[expand]</a></td></tr>",
            deal.id
        );
    }
    body.push_str("</table>");
    if !summary.entries.is_empty() {
        body.push_str(&directory_table(&view, &summary.entries));
    }
    page(&format!("Deal {}", deal.id), &body)
}

/// Sectors of a provider with each deal's piece CID, where known.
pub fn sectors(
    provider: &ProviderAddress,
    sectors: &[SectorInfo],
    pieces: &BTreeMap<DealId, Cid>,
) -> String {
    let mut rows = String::new();
    for sector in sectors {
        let deals: String = sector
            .deal_ids
            .iter()
            .map(|id| match pieces.get(id) {
                Some(piece) => format!("<a href=\"/deal/{id}\">{id}</a> ({piece})<br>"),
                None => format!("<a href=\"/deal/{id}\">{id}</a><br>"),
            })
            .collect();
        let _ = write!(rows, "<tr><td>{}</td><td>{deals}</td></tr>", sector.sector_number);
    }
    let body = format!(
        "<h3>Sectors of {}</h3><table><tr><th>Sector</th><th>Deals</th></tr>{rows}</table>",
        escape(provider.as_str())
    );
    page(&format!("Sectors of {provider}"), &body)
}

/// Landing page.
pub fn index() -> String {
    let body = "<h3>dagex explorer</h3><ul>\
        <li><a href=\"/miners\">Storage miners</a></li>\
        <li><a href=\"/deals\">Client deals</a></li>\
        </ul><p>Browse any DAG at <code>/view/&lt;provider&gt;/&lt;piece&gt;/&lt;cid&gt;[/path]</code>, \
        or export it at <code>/car/...</code>.</p>";
    page("dagex explorer", body)
}

/// Storage miners in the order given, with their locked collateral.
pub fn miners(miners: &[MarketParticipant]) -> String {
    let mut rows = String::new();
    for miner in miners {
        let _ = write!(
            rows,
            "<tr><td><a href=\"/minersectors/{addr}\">{addr}</a></td><td>{locked}</td>\
             <td><a href=\"/ping/miner/{addr}\">[ping]</a></td></tr>",
            addr = escape(miner.address.as_str()),
            locked = miner.locked,
        );
    }
    let body = format!(
        "<h3>Storage miners ({})</h3><table><tr><th>Miner</th><th>Locked</th><th></th></tr>{rows}</table>",
        miners.len()
    );
    page("Storage miners", &body)
}

/// Deals made by this client. Published deals link to their deal page.
pub fn client_deals(deals: &[ClientDeal]) -> String {
    let mut rows = String::new();
    for deal in deals {
        let id = match deal.deal_id {
            Some(id) => format!("<a href=\"/deal/{id}\">{id}</a>"),
            None => "-".to_string(),
        };
        let state = if deal.is_active() {
            format!("<b>{}</b>", escape(&deal.state))
        } else {
            escape(&deal.state)
        };
        let view = format!("/view/{}/{}/{}", deal.provider, deal.piece_cid, deal.root);
        let _ = write!(
            rows,
            "<tr><td>{id}</td><td>{state}</td>\
             <td><a href=\"/minersectors/{provider}\">{provider}</a></td>\
             <td><a href=\"{view}\">{root}</a></td><td>{size}</td><td>{price}</td>\
             <td>{duration}</td><td>{verified}</td><td>{message}</td></tr>",
            provider = escape(deal.provider.as_str()),
            view = escape(&view),
            root = deal.root,
            size = size_str(deal.size),
            price = deal.price_per_epoch,
            duration = deal.duration,
            verified = deal.verified,
            message = escape(&deal.message),
        );
    }
    let active = deals.iter().filter(|d| d.is_active()).count();
    let body = format!(
        "<h3>Client deals ({active} active of {})</h3><table><tr><th>Deal</th><th>State</th>\
         <th>Provider</th><th>Root</th><th>Size</th><th>Price / epoch</th><th>Duration</th>\
         <th>Verified</th><th>Message</th></tr>{rows}</table>",
        deals.len()
    );
    page("Client deals", &body)
}
