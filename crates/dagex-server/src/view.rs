//! Browsing and export of retrieved DAGs.

use std::collections::HashMap;

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::header::{
    ACCEPT_RANGES, CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, RANGE,
};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::response::Response;
use dagex_resolver::content_type::{detect, from_prefix, SNIFF_LEN};
use dagex_resolver::{classify_block, dump, list_directory, ContentReader, NodeKind};
use dagex_retrieval::{Retrieved, Target};
use dagex_selector::{compile_path, presets, Selector};
use dagex_types::{parse_cid, size_str, ProviderAddress};
use serde::Deserialize;
use tracing::debug;

use crate::error::{ServerError, ServerResult};
use crate::range::ByteRange;
use crate::render;
use crate::state::AppState;

pub const CAR_CONTENT_TYPE: &str = "application/vnd.ipld.car";

#[derive(Debug, Default, Deserialize)]
pub struct ViewQuery {
    pub filename: Option<String>,
}

impl ViewQuery {
    fn filename(&self) -> Option<&str> {
        self.filename.as_deref().filter(|f| !f.is_empty())
    }
}

/// Provider, piece and root from the route, plus the optional sub-path.
fn target_from(params: &HashMap<String, String>) -> ServerResult<(Target, String)> {
    let param = |key: &str| {
        params
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| ServerError::BadRequest(format!("missing {key}")))
    };
    let target = Target {
        provider: ProviderAddress::parse(param("provider")?)?,
        piece_cid: parse_cid(param("piece")?)?,
        root: parse_cid(param("cid")?)?,
    };
    let path = params.get("path").cloned().unwrap_or_default();
    Ok((target, path))
}

async fn retrieve(
    state: &AppState,
    target: &Target,
    path: &str,
    base: Selector,
) -> ServerResult<Retrieved> {
    let selector = compile_path(path, base)?;
    Ok(state.fetcher.fetch_dag(target, &selector).await?)
}

fn respond(builder: axum::http::response::Builder, body: Body) -> ServerResult<Response> {
    builder
        .body(body)
        .map_err(|e| ServerError::Internal(e.to_string()))
}

fn header(value: &str) -> ServerResult<HeaderValue> {
    HeaderValue::from_str(value).map_err(|_| ServerError::BadRequest(format!("invalid header value {value:?}")))
}

/// `Content-Disposition` with an ASCII fallback name and, when that lost
/// anything, the exact name as `filename*`.
fn content_disposition(kind: &str, name: &str) -> ServerResult<HeaderValue> {
    let fallback: String = name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '_',
        })
        .collect();
    let mut value = format!("{kind}; filename=\"{fallback}\"");
    if fallback != name {
        value.push_str("; filename*=UTF-8''");
        value.push_str(&render::percent_encode(name));
    }
    header(&value)
}

fn html(body: String, human: Option<&str>, desc: &str) -> ServerResult<Response> {
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "text/html")
        .header("X-Desc", header(desc)?);
    if let Some(human) = human {
        builder = builder.header("X-HumanSize", header(human)?);
    }
    respond(builder, Body::from(body))
}

/// `GET|HEAD /view/:provider/:piece/:cid[/*path]`
///
/// A GET first retrieves a preview (the target plus the first-leaf chains
/// of its first children) and then decides what to serve. A HEAD retrieves
/// only the target, plus the first-leaf chain of a file for sniffing.
pub async fn view_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    Path(params): Path<HashMap<String, String>>,
    Query(query): Query<ViewQuery>,
    headers: HeaderMap,
) -> ServerResult<Response> {
    let (target, path) = target_from(&params)?;
    let head = method == Method::HEAD;
    let preview = if head {
        presets::head()
    } else {
        presets::directory_preview(&state.limits)
    };

    let retrieved = retrieve(&state, &target, &path, preview).await?;
    let root = retrieved.root;
    let kind = classify_block(&retrieved.dag.block(&root)?)?;
    let human = kind.size().map(size_str);
    debug!(%root, kind = %kind.label(), path = %path, "resolved view target");

    match kind {
        NodeKind::Directory { .. } | NodeKind::ShardedDirectory { .. } => {
            let desc = kind.label();
            if head {
                return html(String::new(), human.as_deref(), &desc);
            }
            let entries = list_directory(&retrieved.dag, &root, &state.limits)?;
            html(render::directory(uri.path(), &entries), human.as_deref(), &desc)
        }
        NodeKind::File { .. } => {
            let selector = if head {
                presets::first_leaf_chain(state.limits.max_depth)
            } else {
                Selector::union([Selector::Matcher, presets::file_contents(state.limits.max_depth)])
            };
            let file = retrieve(&state, &target, &path, selector).await?;
            let reader = ContentReader::open(&file.dag, &root)?;
            serve_content(reader, query.filename(), &headers, head, human.as_deref())
        }
        NodeKind::RawFile { .. } => {
            let reader = ContentReader::open(&retrieved.dag, &root)?;
            serve_content(reader, query.filename(), &headers, head, human.as_deref())
        }
        NodeKind::StructuredData { .. } => {
            let desc = kind.label();
            if head {
                return html(String::new(), human.as_deref(), &desc);
            }
            let tree = dump(&retrieved.dag, &root, &state.limits)?;
            html(render::dump(uri.path(), &tree), human.as_deref(), &desc)
        }
        NodeKind::Symlink { target: link } => {
            let builder = Response::builder()
                .header(CONTENT_TYPE, "text/plain; charset=utf-8")
                .header("X-Desc", "LINK");
            respond(builder, Body::from(link))
        }
        NodeKind::Unknown { codec } => Err(ServerError::UnknownCodec(codec)),
    }
}

/// Serve file bytes with content type, size headers and single-range
/// support.
fn serve_content(
    mut reader: ContentReader,
    filename: Option<&str>,
    headers: &HeaderMap,
    head: bool,
    human: Option<&str>,
) -> ServerResult<Response> {
    let ctype = if head {
        from_prefix(filename, &reader.head(SNIFF_LEN)?)
    } else {
        detect(&mut reader, filename)?
    };
    let size = reader.size();
    let range = ByteRange::parse(headers.get(RANGE).and_then(|v| v.to_str().ok()), size);

    let mut builder = Response::builder()
        .header(CONTENT_TYPE, header(&ctype)?)
        .header(ACCEPT_RANGES, "bytes")
        .header("X-Desc", header(&format!("FILE ({ctype})"))?);
    if let Some(human) = human {
        builder = builder.header("X-HumanSize", header(human)?);
    }
    if let Some(name) = filename {
        builder = builder.header(CONTENT_DISPOSITION, content_disposition("inline", name)?);
    }
    if let Some(content_range) = range.content_range(size) {
        builder = builder.header(CONTENT_RANGE, header(&content_range)?);
    }

    let (status, start, len) = match range {
        ByteRange::Full => (StatusCode::OK, 0, size),
        ByteRange::Partial { start, end } => (StatusCode::PARTIAL_CONTENT, start, end - start + 1),
        ByteRange::Unsatisfiable => {
            return respond(builder.status(StatusCode::RANGE_NOT_SATISFIABLE), Body::empty());
        }
    };
    builder = builder.status(status).header(CONTENT_LENGTH, len);
    if head {
        return respond(builder, Body::empty());
    }
    let body = reader.read_range(start, len)?;
    if body.len() as u64 != len {
        return Err(ServerError::Internal(format!(
            "file ended after {} of {len} bytes",
            body.len()
        )));
    }
    respond(builder, Body::from(body))
}

/// `GET /car/:provider/:piece/:cid[/*path]`: the archive of everything
/// under the target, streamed as it is exported.
pub async fn car_handler(
    State(state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
    Query(query): Query<ViewQuery>,
) -> ServerResult<Response> {
    let (target, path) = target_from(&params)?;
    let selector = compile_path(&path, presets::full_export())?;
    let archive = state.fetcher.fetch_archive(&target, &selector).await?;

    let name = query
        .filename()
        .map(str::to_string)
        .unwrap_or_else(|| target.root.to_string());
    let builder = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, CAR_CONTENT_TYPE)
        .header(CONTENT_DISPOSITION, content_disposition("attachment", &format!("{name}.car"))?);
    respond(builder, Body::from_stream(archive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use dagex_dag::pb::{Link, ProtoNode};
    use dagex_dag::unixfs::{DataType, UnixfsData};
    use dagex_dag::DagService;
    use dagex_store::{Block, BlockStore, MemoryBlockStore};
    use dagex_types::Codec;

    #[test]
    fn disposition_keeps_quotes_out_of_the_header() {
        assert_eq!(content_disposition("inline", "notes.txt").unwrap(), "inline; filename=\"notes.txt\"");
        assert_eq!(
            content_disposition("attachment", "a\"b.car").unwrap(),
            "attachment; filename=\"a_b.car\"; filename*=UTF-8''a%22b.car"
        );
        assert_eq!(
            content_disposition("inline", "é.txt").unwrap(),
            "inline; filename=\"_.txt\"; filename*=UTF-8''%C3%A9.txt"
        );
    }

    #[test]
    fn file_shorter_than_its_size_is_an_error() {
        let store = Arc::new(MemoryBlockStore::new());
        let leaf = Block::encode(Codec::RAW, &b"tiny"[..]);
        store.put(leaf.clone()).unwrap();
        let mut fs = UnixfsData::new(DataType::File);
        fs.filesize = Some(100);
        fs.blocksizes = vec![4];
        let node = ProtoNode::new(Some(fs.encode().into()), vec![Link::new(leaf.cid, "", 4)]);
        let root = Block::encode(Codec::DAG_PB, node.encode());
        store.put(root.clone()).unwrap();

        let reader = ContentReader::open(&DagService::new(store), &root.cid).unwrap();
        match serve_content(reader, None, &HeaderMap::new(), false, None) {
            Err(ServerError::Internal(msg)) => assert!(msg.contains("4 of 100"), "{msg}"),
            Err(other) => panic!("unexpected error {other}"),
            Ok(_) => panic!("short body served"),
        }
    }
}
