//! HTTP explorer for dagex.
//!
//! Serves browsable views of DAGs retrieved on demand from storage
//! providers: directory listings, file contents with byte ranges, structural
//! dumps of DAG-CBOR data, raw archive export, and deal/sector pages over
//! chain state.

pub mod chain;
pub mod config;
pub mod error;
pub mod handler;
pub mod range;
pub mod render;
pub mod router;
pub mod server;
pub mod state;
pub mod view;

pub use config::ExplorerConfig;
pub use error::{ServerError, ServerResult};
pub use server::ExplorerServer;
pub use state::AppState;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, Response, StatusCode};
    use cid::Cid;
    use dagex_dag::{DagBuilder, DagService};
    use dagex_retrieval::local::ChainSnapshot;
    use dagex_retrieval::{
        ClientDeal, DealProposal, MarketParticipant, PriceCeiling, SectorInfo, StorageDeal,
    };
    use dagex_selector::{presets, walk};
    use dagex_store::{Block, CarBlockStore, CarWriter, MemoryBlockStore};
    use dagex_types::{Codec, DealId, ProviderAddress, TokenAmount};
    use ipld_core::ipld::Ipld;
    use tower::util::ServiceExt;

    const HTML_PAGE: &[u8] = b"<!DOCTYPE html><html><body>hi</body></html>";

    struct Fixture {
        _dir: tempfile::TempDir,
        config: ExplorerConfig,
        piece: Cid,
        dir: Cid,
        text: Cid,
        cbor: Cid,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with_price(TokenAmount::zero())
        }

        /// One piece holding a directory (`notes.txt`, `page`, `sub/`) and
        /// a DAG-CBOR map linking to a raw PDF.
        fn with_price(price: TokenAmount) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let dag = DagService::new(Arc::new(MemoryBlockStore::new()));
            let b = DagBuilder::new(dag.clone());

            let text = b.add_file(&b"hello, explorer"[..]).unwrap();
            let page = b.add_file(HTML_PAGE).unwrap();
            let sub = b.add_directory(vec![text.link("again.txt")]).unwrap();
            let root = b
                .add_directory(vec![text.link("notes.txt"), page.link("page"), sub.link("sub")])
                .unwrap();
            let pdf = b.add_raw(&b"%PDF-1.4 tiny"[..]).unwrap();
            let cbor = b
                .add_cbor(&Ipld::Map(BTreeMap::from([
                    ("doc".to_string(), Ipld::Link(pdf.cid)),
                    ("n".to_string(), Ipld::Integer(7)),
                ])))
                .unwrap();

            let piece = Block::encode(Codec::RAW, &b"piece-1"[..]).cid;
            let mut writer = CarWriter::new(root.cid);
            for start in [root.cid, cbor.cid] {
                for block in walk(&dag, &start, &presets::full_export()).unwrap() {
                    writer.add_block(&block);
                }
            }
            std::fs::write(dir.path().join(format!("{piece}.car")), writer.finish().unwrap()).unwrap();

            let snapshot = ChainSnapshot {
                deals: vec![StorageDeal {
                    id: DealId(42),
                    proposal: DealProposal {
                        piece_cid: piece,
                        piece_size: 1 << 20,
                        verified: false,
                        client: "f0100".into(),
                        provider: ProviderAddress::parse("f01000").unwrap(),
                        label: root.cid.to_string(),
                        start_epoch: 100,
                        end_epoch: 200,
                        storage_price_per_epoch: TokenAmount::zero(),
                    },
                }],
                sectors: BTreeMap::from([(
                    "f01000".to_string(),
                    vec![SectorInfo {
                        sector_number: 9,
                        deal_ids: vec![DealId(42), DealId(43)],
                    }],
                )]),
                participants: [("f01000", 5, true), ("f02000", 9, true), ("f0100", 3, false), ("f03000", 0, true)]
                    .into_iter()
                    .map(|(address, locked, miner)| MarketParticipant {
                        address: ProviderAddress::parse(address).unwrap(),
                        locked: TokenAmount::from_atto(locked),
                        miner,
                    })
                    .collect(),
                client_deals: [(Some(DealId(42)), "StorageDealActive"), (None, "StorageDealFundsReserved")]
                    .into_iter()
                    .map(|(deal_id, state)| ClientDeal {
                        proposal_cid: cbor.cid,
                        state: state.to_string(),
                        message: String::new(),
                        provider: ProviderAddress::parse("f01000").unwrap(),
                        root: root.cid,
                        piece_cid: piece,
                        size: 2048,
                        price_per_epoch: TokenAmount::zero(),
                        duration: 518_400,
                        deal_id,
                        verified: false,
                    })
                    .collect(),
            };
            let deals_file = dir.path().join("deals.json");
            std::fs::write(&deals_file, serde_json::to_string(&snapshot).unwrap()).unwrap();

            let mut config = ExplorerConfig::default();
            config.provider.pieces_dir = dir.path().to_path_buf();
            config.provider.deals_file = Some(deals_file);
            config.provider.price = price;
            Fixture {
                _dir: dir,
                config,
                piece,
                dir: root.cid,
                text: text.cid,
                cbor: cbor.cid,
            }
        }

        fn app(&self) -> axum::Router {
            ExplorerServer::local(self.config.clone()).unwrap().router()
        }

        fn view(&self, root: &Cid, rest: &str) -> String {
            format!("/view/f01000/{}/{root}{rest}", self.piece)
        }
    }

    async fn send(app: axum::Router, request: Request<Body>) -> Response<Body> {
        app.oneshot(request).await.unwrap()
    }

    async fn get(app: axum::Router, uri: &str) -> Response<Body> {
        send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
    }

    async fn body(response: Response<Body>) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    fn header<'a>(response: &'a Response<Body>, name: &str) -> &'a str {
        response.headers()[name].to_str().unwrap()
    }

    // ----------------------------------------------------------------
    // Service endpoints
    // ----------------------------------------------------------------

    #[tokio::test]
    async fn health_endpoint() {
        let fx = Fixture::new();
        let response = get(fx.app(), "/v1/health").await;
        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn info_endpoint() {
        let fx = Fixture::new();
        let response = get(fx.app(), "/v1/info").await;
        assert_eq!(response.status(), 200);
        let info: serde_json::Value = serde_json::from_slice(&body(response).await).unwrap();
        assert_eq!(info["name"], "dagex-server");
    }

    // ----------------------------------------------------------------
    // View
    // ----------------------------------------------------------------

    #[tokio::test]
    async fn directory_listing() {
        let fx = Fixture::new();
        let response = get(fx.app(), &fx.view(&fx.dir, "")).await;
        assert_eq!(response.status(), 200);
        assert_eq!(header(&response, "content-type"), "text/html");
        assert_eq!(header(&response, "x-desc"), "DIR (3 entries)");
        assert!(response.headers().contains_key("x-humansize"));

        let html = String::from_utf8(body(response).await).unwrap();
        assert!(html.contains("notes.txt"));
        assert!(html.contains("FILE (text/plain)"));
        assert!(html.contains("DIR (1 entries)"));
        assert!(html.contains(&fx.text.to_string()));
        assert!(html.contains("/Links/0/Hash?filename=notes.txt"));
    }

    #[tokio::test]
    async fn head_on_directory_has_no_body() {
        let fx = Fixture::new();
        let request = Request::builder()
            .method("HEAD")
            .uri(fx.view(&fx.dir, "/Links/2/Hash"))
            .body(Body::empty())
            .unwrap();
        let response = send(fx.app(), request).await;
        assert_eq!(response.status(), 200);
        assert_eq!(header(&response, "x-desc"), "DIR (1 entries)");
        assert!(body(response).await.is_empty());
    }

    #[tokio::test]
    async fn file_by_path() {
        let fx = Fixture::new();
        let uri = fx.view(&fx.dir, "/Links/2/Hash/Links/0/Hash?filename=again.txt");
        let response = get(fx.app(), &uri).await;
        assert_eq!(response.status(), 200);
        assert_eq!(header(&response, "content-type"), "text/plain");
        assert_eq!(
            header(&response, "content-disposition"),
            "inline; filename=\"again.txt\""
        );
        assert_eq!(body(response).await, b"hello, explorer");
    }

    #[tokio::test]
    async fn sniffed_html_is_plain_text_html() {
        let fx = Fixture::new();
        let response = get(fx.app(), &fx.view(&fx.dir, "/Links/1/Hash")).await;
        assert_eq!(response.status(), 200);
        assert_eq!(header(&response, "content-type"), "text/html");
        assert_eq!(body(response).await, HTML_PAGE);
    }

    #[tokio::test]
    async fn byte_range() {
        let fx = Fixture::new();
        let request = Request::builder()
            .uri(fx.view(&fx.text, ""))
            .header("range", "bytes=7-14")
            .body(Body::empty())
            .unwrap();
        let response = send(fx.app(), request).await;
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(header(&response, "content-range"), "bytes 7-14/15");
        assert_eq!(body(response).await, b"explorer");
    }

    #[tokio::test]
    async fn structured_data_dump() {
        let fx = Fixture::new();
        let response = get(fx.app(), &fx.view(&fx.cbor, "")).await;
        assert_eq!(response.status(), 200);
        assert_eq!(header(&response, "x-desc"), "DAG-CBOR");
        let html = String::from_utf8(body(response).await).unwrap();
        assert!(html.contains("<span>MAP</span>"));
        assert!(html.contains("FILE (raw,application/pdf)"));
        assert!(html.contains("<span class=\"node\">7</span>"));
    }

    #[tokio::test]
    async fn missing_path_is_an_error() {
        let fx = Fixture::new();
        let response = get(fx.app(), &fx.view(&fx.dir, "/nope")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn invalid_cid_is_an_error() {
        let fx = Fixture::new();
        let response = get(fx.app(), &format!("/view/f01000/{}/not-a-cid", fx.piece)).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let message = String::from_utf8(body(response).await).unwrap();
        assert!(message.contains("not-a-cid"));
    }

    #[tokio::test]
    async fn paid_retrieval_over_free_ceiling_fails() {
        let fx = Fixture::with_price(TokenAmount::from_atto(1));
        assert_eq!(fx.config.retrieval.price_ceiling, PriceCeiling::default());
        let response = get(fx.app(), &fx.view(&fx.dir, "")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    // ----------------------------------------------------------------
    // Archive export
    // ----------------------------------------------------------------

    #[tokio::test]
    async fn car_export_of_sub_path() {
        let fx = Fixture::new();
        let uri = format!("/car/f01000/{}/{}/Links/2/Hash", fx.piece, fx.dir);
        let response = get(fx.app(), &uri).await;
        assert_eq!(response.status(), 200);
        assert_eq!(header(&response, "content-type"), "application/vnd.ipld.car");

        let car = CarBlockStore::open(body(response).await).unwrap();
        let sub = car.single_root().unwrap();
        assert_ne!(sub, fx.dir);
        // Path proof plus the sub-directory and its file.
        assert_eq!(car.len(), 3);
    }

    #[tokio::test]
    async fn car_filename_defaults_to_cid() {
        let fx = Fixture::new();
        let response = get(fx.app(), &format!("/car/f01000/{}/{}", fx.piece, fx.text)).await;
        assert_eq!(
            header(&response, "content-disposition"),
            format!("attachment; filename=\"{}.car\"", fx.text)
        );
    }

    // ----------------------------------------------------------------
    // Chain views
    // ----------------------------------------------------------------

    #[tokio::test]
    async fn deal_page_describes_root() {
        let fx = Fixture::new();
        let response = get(fx.app(), "/deal/42?expand=1").await;
        assert_eq!(response.status(), 200);
        let html = String::from_utf8(body(response).await).unwrap();
        assert!(html.contains("<td>Type</td><td>DIR</td>"));
        assert!(html.contains("notes.txt"));
    }

    #[tokio::test]
    async fn unknown_deal_is_an_error() {
        let fx = Fixture::new();
        let response = get(fx.app(), "/deal/7").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn miner_sectors_skip_failed_lookups() {
        let fx = Fixture::new();
        let response = get(fx.app(), "/minersectors/f01000").await;
        assert_eq!(response.status(), 200);
        let html = String::from_utf8(body(response).await).unwrap();
        assert!(html.contains(&format!("<a href=\"/deal/42\">42</a> ({})", fx.piece)));
        assert!(html.contains("<a href=\"/deal/43\">43</a><br>"));
    }

    #[tokio::test]
    async fn index_links_views() {
        let fx = Fixture::new();
        let response = get(fx.app(), "/").await;
        assert_eq!(response.status(), 200);
        let html = String::from_utf8(body(response).await).unwrap();
        assert!(html.contains("href=\"/miners\""));
        assert!(html.contains("href=\"/deals\""));
    }

    #[tokio::test]
    async fn miners_sorted_by_locked_funds() {
        let fx = Fixture::new();
        let response = get(fx.app(), "/miners").await;
        assert_eq!(response.status(), 200);
        let html = String::from_utf8(body(response).await).unwrap();
        let first = html.find("/minersectors/f02000").unwrap();
        let second = html.find("/minersectors/f01000").unwrap();
        assert!(first < second);
        assert!(!html.contains("/minersectors/f0100\""));
        assert!(!html.contains("f03000"));
        assert!(html.contains("Storage miners (2)"));
    }

    #[tokio::test]
    async fn client_deals_link_published_deals() {
        let fx = Fixture::new();
        let response = get(fx.app(), "/deals").await;
        assert_eq!(response.status(), 200);
        let html = String::from_utf8(body(response).await).unwrap();
        assert!(html.contains("<a href=\"/deal/42\">42</a>"));
        assert!(html.contains("<b>StorageDealActive</b>"));
        assert!(html.contains("<td>-</td><td>StorageDealFundsReserved</td>"));
        assert!(html.contains(&fx.view(&fx.dir, "")));
        assert!(html.contains("1 active of 2"));
    }

    #[tokio::test]
    async fn ping_reports_peer_and_round_trip() {
        let fx = Fixture::new();
        let response = get(fx.app(), "/ping/miner/f01000").await;
        assert_eq!(response.status(), 200);
        assert!(header(&response, "content-type").starts_with("text/html"));
        let text = String::from_utf8(body(response).await).unwrap();
        let (peer, rtt) = text.split_once(' ').unwrap();
        assert_eq!(peer, "local-f01000");
        assert!(rtt.ends_with("ms"), "{text}");
    }

    #[tokio::test]
    async fn ping_of_bad_address_is_an_error() {
        let fx = Fixture::new();
        let response = get(fx.app(), "/ping/miner/nope").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn provider_info() {
        let fx = Fixture::new();
        let response = get(fx.app(), "/provider/f01000").await;
        assert_eq!(response.status(), 200);
        let info: serde_json::Value = serde_json::from_slice(&body(response).await).unwrap();
        assert_eq!(info["peer_id"], "local-f01000");
    }
}
