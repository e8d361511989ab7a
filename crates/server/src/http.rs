//! The tiny_http request loop.

use anyhow::{anyhow, Result};
use serde_json::Value;
use tiny_http::{Header, Method, Response, Server};
use tracing::{debug, info, warn};

use cs_store::WorkspacePaths;

use crate::api::{parse_query, ApiResponse, EditApi};
use crate::config::ServerConfig;
use crate::stream::serve_stream;

pub struct EditServer {
    config: ServerConfig,
    paths: WorkspacePaths,
    api: EditApi,
}

impl EditServer {
    pub fn new(config: ServerConfig) -> Result<Self> {
        let paths = WorkspacePaths::new(&config.workspace);
        let api = EditApi::new(paths.clone())?;
        Ok(Self { config, paths, api })
    }

    /// Serve until the process is interrupted.
    pub fn run(self) -> Result<()> {
        let addr = self.config.addr();
        let server = Server::http(&addr).map_err(|e| anyhow!("http bind failed: {e}"))?;
        info!(%addr, workspace = %self.paths.root().display(), "edit server listening");

        for mut request in server.incoming_requests() {
            let method = request.method().clone();
            let url = request.url().to_string();
            let path = url.split('?').next().unwrap_or("");
            debug!(%method, %url, "request");

            match (&method, path) {
                (Method::Get, "/health") => {
                    let _ = request.respond(Response::from_string("ok"));
                }
                (Method::Get, "/edits/stream") => {
                    // one thread per stream consumer; the loop stays free
                    let paths = self.paths.clone();
                    std::thread::spawn(move || serve_stream(request, paths));
                }
                (Method::Get, "/edits") => {
                    let response = self.api.handle_get(&parse_query(&url));
                    respond_json(request, response);
                }
                (Method::Post, "/edits") => {
                    let mut body = String::new();
                    if let Err(error) = request.as_reader().read_to_string(&mut body) {
                        warn!(%error, "failed to read request body");
                        let _ = request.respond(
                            Response::from_string("read error").with_status_code(400),
                        );
                        continue;
                    }
                    let response = match serde_json::from_str::<Value>(&body) {
                        Ok(parsed) => self.api.handle_post(&parsed),
                        Err(error) => ApiResponse {
                            status: 400,
                            body: serde_json::json!({
                                "success": false,
                                "error": format!("invalid JSON body: {error}")
                            }),
                        },
                    };
                    respond_json(request, response);
                }
                _ => {
                    let _ =
                        request.respond(Response::from_string("not found").with_status_code(404));
                }
            }
        }
        Ok(())
    }
}

fn respond_json(request: tiny_http::Request, response: ApiResponse) {
    let mut http_response = Response::from_string(response.body.to_string())
        .with_status_code(response.status);
    http_response.add_header(
        Header::from_bytes("Content-Type", "application/json").expect("static header"),
    );
    let _ = request.respond(http_response);
}
