//! m2g graph-services client.
//!
//! Uploads zipped fiber, atlas and graph files to the m2g graph services
//! and returns their replies.  Every upload can also run on a background
//! thread, with the reply handed to a callback.

use crate::error::{Error, Result};
use crate::http::{HttpBackend, HttpRequest, Method, ReqwestBackend, SendOptions};
use std::fmt;
use std::fs::File;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const DEFAULT_HOSTNAME: &str = "openconnecto.me";
pub const DEFAULT_PROTOCOL: &str = "http";
pub const DEFAULT_EMAIL: &str = "";

const SERVICE_ROOT: &str = "graph-services";

/// Graph invariants the services can compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Invariant {
    ScanStatistic,
    TriangleCount,
    ClusteringCoefficient,
    MaxAverageDegree,
    LocalDegree,
    /// Top 100 (or as many as exist) eigenvalues and eigenvectors.
    Eigens,
}

impl Invariant {
    pub const ALL: [Invariant; 6] = [
        Invariant::ScanStatistic,
        Invariant::TriangleCount,
        Invariant::ClusteringCoefficient,
        Invariant::MaxAverageDegree,
        Invariant::LocalDegree,
        Invariant::Eigens,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Invariant::ScanStatistic => "ss1",
            Invariant::TriangleCount => "tri",
            Invariant::ClusteringCoefficient => "cc",
            Invariant::MaxAverageDegree => "mad",
            Invariant::LocalDegree => "deg",
            Invariant::Eigens => "eig",
        }
    }
}

impl fmt::Display for Invariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Invariant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Invariant::ALL
            .iter()
            .find(|i| i.as_str() == s)
            .copied()
            .ok_or_else(|| Error::InvalidArgument(format!("unknown invariant {}", s)))
    }
}

/// Graph file formats the services read and write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphFormat {
    GraphMl,
    Ncol,
    EdgeList,
    Lgl,
    Pajek,
    GraphDb,
    Numpy,
    Mat,
}

impl GraphFormat {
    pub const ALL: [GraphFormat; 8] = [
        GraphFormat::GraphMl,
        GraphFormat::Ncol,
        GraphFormat::EdgeList,
        GraphFormat::Lgl,
        GraphFormat::Pajek,
        GraphFormat::GraphDb,
        GraphFormat::Numpy,
        GraphFormat::Mat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GraphFormat::GraphMl => "graphml",
            GraphFormat::Ncol => "ncol",
            GraphFormat::EdgeList => "edgelist",
            GraphFormat::Lgl => "lgl",
            GraphFormat::Pajek => "pajek",
            GraphFormat::GraphDb => "graphdb",
            GraphFormat::Numpy => "numpy",
            GraphFormat::Mat => "mat",
        }
    }
}

impl fmt::Display for GraphFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GraphFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        GraphFormat::ALL
            .iter()
            .find(|g| g.as_str() == s)
            .copied()
            .ok_or_else(|| Error::InvalidArgument(format!("invalid graph format {}", s)))
    }
}

/// Size of graph to build; see m2g.io for the difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphSize {
    Small,
    Big,
}

impl GraphSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            GraphSize::Small => "s",
            GraphSize::Big => "b",
        }
    }
}

impl FromStr for GraphSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "s" => Ok(GraphSize::Small),
            "b" => Ok(GraphSize::Big),
            other => Err(Error::InvalidArgument(format!(
                "size must be 's' (small) or 'b' (big), not {}",
                other
            ))),
        }
    }
}

/// Inputs for [`M2g::build_graph`].
#[derive(Debug, Clone)]
pub struct BuildGraphRequest {
    pub project: String,
    pub site: String,
    pub subject: String,
    pub session: String,
    pub scan: String,
    pub size: GraphSize,
    /// Falls back to the client's default email.
    pub email: Option<String>,
    pub invariants: Vec<Invariant>,
    /// MRI Studio `.dat` fiber file.
    pub fiber_file: PathBuf,
    /// NIFTI atlas; the server uses the Desikan atlas when absent.
    pub atlas_file: Option<PathBuf>,
}

/// A validated upload: where to send it and what to zip.
#[derive(Debug, Clone)]
struct Upload {
    url: String,
    files: Vec<PathBuf>,
}

/// Client for the m2g graph services.
pub struct M2g {
    hostname: String,
    protocol: String,
    email: String,
    backend: Arc<dyn HttpBackend>,
}

impl M2g {
    pub fn new(hostname: &str, protocol: &str, email: &str) -> Result<M2g> {
        let backend = ReqwestBackend::new(SendOptions::default())?;
        Ok(M2g::with_backend(hostname, protocol, email, Arc::new(backend)))
    }

    pub fn with_backend(hostname: &str, protocol: &str, email: &str, backend: Arc<dyn HttpBackend>) -> M2g {
        M2g {
            hostname: hostname.to_string(),
            protocol: protocol.to_string(),
            email: email.to_string(),
            backend,
        }
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Full URL of a graph-services endpoint.
    pub fn url(&self, suffix: &str) -> String {
        format!(
            "{}://{}/{}/{}",
            self.protocol,
            self.hostname,
            SERVICE_ROOT,
            suffix.trim_start_matches('/')
        )
    }

    /// Status code of the services root.
    pub fn ping(&self) -> Result<u16> {
        let resp = self.backend.send(HttpRequest::new(Method::GET, self.url("")))?;
        Ok(resp.status)
    }

    /// Set the email notified when none is given per call.  Only checks
    /// for an `@`.
    pub fn set_default_email(&mut self, email: &str) -> Result<()> {
        if !email.contains('@') {
            return Err(Error::InvalidArgument("Invalid email.".to_string()));
        }
        self.email = email.to_string();
        Ok(())
    }

    pub fn build_graph(&self, request: &BuildGraphRequest) -> Result<Vec<u8>> {
        let upload = self.prepare_build_graph(request)?;
        run_upload(self.backend.as_ref(), &upload)
    }

    /// Run [`M2g::build_graph`] on a background thread.  Arguments are
    /// validated before the thread starts.
    pub fn build_graph_background<F>(&self, request: &BuildGraphRequest, callback: F) -> Result<JoinHandle<()>>
    where
        F: FnOnce(Result<Vec<u8>>) + Send + 'static,
    {
        let upload = self.prepare_build_graph(request)?;
        Ok(self.spawn_upload(upload, callback))
    }

    pub fn compute_invariants(
        &self,
        graph_file: &Path,
        input_format: GraphFormat,
        invariants: &[Invariant],
        email: Option<&str>,
    ) -> Result<Vec<u8>> {
        let upload = self.prepare_compute_invariants(graph_file, input_format, invariants, email)?;
        run_upload(self.backend.as_ref(), &upload)
    }

    pub fn compute_invariants_background<F>(
        &self,
        graph_file: &Path,
        input_format: GraphFormat,
        invariants: &[Invariant],
        email: Option<&str>,
        callback: F,
    ) -> Result<JoinHandle<()>>
    where
        F: FnOnce(Result<Vec<u8>>) + Send + 'static,
    {
        let upload = self.prepare_compute_invariants(graph_file, input_format, invariants, email)?;
        Ok(self.spawn_upload(upload, callback))
    }

    pub fn convert_graph(
        &self,
        graph_file: &Path,
        input_format: GraphFormat,
        output_formats: &[GraphFormat],
        email: Option<&str>,
    ) -> Result<Vec<u8>> {
        let upload = self.prepare_convert_graph(graph_file, input_format, output_formats, email)?;
        run_upload(self.backend.as_ref(), &upload)
    }

    pub fn convert_graph_background<F>(
        &self,
        graph_file: &Path,
        input_format: GraphFormat,
        output_formats: &[GraphFormat],
        email: Option<&str>,
        callback: F,
    ) -> Result<JoinHandle<()>>
    where
        F: FnOnce(Result<Vec<u8>>) + Send + 'static,
    {
        let upload = self.prepare_convert_graph(graph_file, input_format, output_formats, email)?;
        Ok(self.spawn_upload(upload, callback))
    }

    fn resolve_email<'a>(&'a self, email: Option<&'a str>) -> Result<&'a str> {
        let email = email.unwrap_or(&self.email);
        if email.is_empty() {
            return Err(Error::InvalidArgument(
                "an email is required; pass one or set a default".to_string(),
            ));
        }
        Ok(email)
    }

    fn prepare_build_graph(&self, request: &BuildGraphRequest) -> Result<Upload> {
        let email = self.resolve_email(request.email.as_deref())?;
        let suffix = format!(
            "buildgraph/{}/{}/{}/{}/{}/{}/{}/{}/",
            request.project,
            request.site,
            request.subject,
            request.session,
            request.scan,
            request.size.as_str(),
            email,
            join_invariants(&request.invariants)?
        );
        let mut files = vec![request.fiber_file.clone()];
        if let Some(atlas) = &request.atlas_file {
            files.push(atlas.clone());
        }
        self.prepare(&suffix, files)
    }

    fn prepare_compute_invariants(
        &self,
        graph_file: &Path,
        input_format: GraphFormat,
        invariants: &[Invariant],
        email: Option<&str>,
    ) -> Result<Upload> {
        let email = self.resolve_email(email)?;
        let suffix = format!(
            "graphupload/{}/{}/{}/",
            email,
            input_format,
            join_invariants(invariants)?
        );
        self.prepare(&suffix, vec![graph_file.to_path_buf()])
    }

    fn prepare_convert_graph(
        &self,
        graph_file: &Path,
        input_format: GraphFormat,
        output_formats: &[GraphFormat],
        email: Option<&str>,
    ) -> Result<Upload> {
        if output_formats.is_empty() {
            return Err(Error::InvalidArgument("at least one output format is required".to_string()));
        }
        let email = self.resolve_email(email)?;
        let outputs: Vec<&str> = output_formats.iter().map(GraphFormat::as_str).collect();
        let suffix = format!("convert/{}/{}/{}/", email, input_format, outputs.join(","));
        self.prepare(&suffix, vec![graph_file.to_path_buf()])
    }

    /// Shared checks: no spaces in the URL, every file present.
    fn prepare(&self, suffix: &str, files: Vec<PathBuf>) -> Result<Upload> {
        if suffix.contains(' ') {
            return Err(Error::InvalidArgument("Arguments must not contain spaces.".to_string()));
        }
        for file in &files {
            if !file.is_file() {
                return Err(Error::InvalidArgument(format!("File {} does not exist.", file.display())));
            }
        }
        Ok(Upload {
            url: self.url(suffix),
            files,
        })
    }

    fn spawn_upload<F>(&self, upload: Upload, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<Vec<u8>>) + Send + 'static,
    {
        let backend = Arc::clone(&self.backend);
        tracing::info!("starting background upload to {}", upload.url);
        thread::spawn(move || {
            let result = run_upload(backend.as_ref(), &upload);
            if let Err(e) = &result {
                tracing::warn!("background upload to {} failed: {}", upload.url, e);
            }
            callback(result);
        })
    }
}

impl fmt::Display for M2g {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m2g('{}', '{}', '{}')", self.hostname, self.protocol, self.email)
    }
}

fn join_invariants(invariants: &[Invariant]) -> Result<String> {
    if invariants.is_empty() {
        return Err(Error::InvalidArgument("at least one invariant is required".to_string()));
    }
    let names: Vec<&str> = invariants.iter().map(Invariant::as_str).collect();
    Ok(names.join("/"))
}

/// Zip `files` (zip64 enabled) into memory, keyed by file name.
fn zip_files(files: &[PathBuf]) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .large_file(true);
    for path in files {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::InvalidArgument(format!("bad file name {}", path.display())))?;
        let mut file = File::open(path)
            .map_err(|e| Error::InvalidArgument(format!("cannot read {}: {}", path.display(), e)))?;
        writer.start_file(name, options)?;
        io::copy(&mut file, &mut writer)?;
    }
    Ok(writer.finish()?.into_inner())
}

fn run_upload(backend: &dyn HttpBackend, upload: &Upload) -> Result<Vec<u8>> {
    let archive = zip_files(&upload.files)?;
    tracing::debug!(bytes = archive.len(), "uploading archive to {}", upload.url);
    let req = HttpRequest::new(Method::POST, upload.url.clone())
        .header("Content-Type", "application/zip")
        .body(archive);
    let resp = backend
        .send(req)
        .map_err(|e| Error::Upload(format!("Failed to upload data at {}: {}", upload.url, e)))?;
    if !resp.is_success() {
        return Err(Error::Upload(format!(
            "Failed to upload data at {}: HTTP {} {}",
            upload.url,
            resp.status,
            resp.text()
        )));
    }
    Ok(resp.body)
}
