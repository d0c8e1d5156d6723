//! Payload assembly.
//!
//! Walks a resource's files, sorts them into upload buckets, uploads each
//! one for a server token and builds the composite push request.

use crate::adapter::ResourceLocation;
use crate::error::{SyncError, SyncResult};
use crate::payload::{FileReference, FileSet, PushPayload, ResourceDescriptor};
use crate::remote::RemoteService;
use crate::source::{file_name, join_path, ContentSource, SourceFile};
use codesync_types::{ResourceKey, VersionStamp};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Path-preserving file bucket.
pub const FILE_TREE_DIR: &str = "fileTree";
/// Flat file bucket.
pub const SOURCE_FILES_DIR: &str = "sourceFiles";
/// Static asset bucket, independent of the other two.
pub const STATIC_DIR: &str = "static";

/// A file read from the source, ready for upload.
struct StagedFile {
    /// Name sent to the upload call.
    name: String,
    /// Path recorded in the request (bucket-relative, or the bare name for
    /// flat files).
    request_path: String,
    /// Resource-relative path, used for the content digest.
    digest_path: String,
    bytes: Vec<u8>,
}

/// Builds push requests for resources.
pub struct PayloadAssembler {
    remote: Arc<dyn RemoteService>,
}

impl PayloadAssembler {
    /// Creates an assembler that uploads through `remote`.
    pub fn new(remote: Arc<dyn RemoteService>) -> Self {
        Self { remote }
    }

    /// Assembles the push request for one resource.
    ///
    /// Bundles (component/plugin) read their metadata document, which must
    /// exist, and their `fileTree/`, `sourceFiles/` and `static/` buckets.
    /// Scripts (function/class) upload their single source file.
    pub async fn assemble(
        &self,
        source: &dyn ContentSource,
        location: &ResourceLocation,
        key: &ResourceKey,
        descriptor: ResourceDescriptor,
        version: VersionStamp,
    ) -> SyncResult<PushPayload> {
        let kind = key.kind();
        let (metadata_xml, files, static_assets, digest) = match kind.metadata_document() {
            Some(document) => self.assemble_bundle(source, location, document).await?,
            None => self.assemble_script(source, location).await?,
        };

        info!(
            "Assembled {}: {} file(s){}, {} static asset(s)",
            key,
            files.files().len(),
            if files.is_tree() { " (tree)" } else { "" },
            static_assets.len()
        );

        Ok(PushPayload {
            key: key.clone(),
            descriptor,
            metadata_xml,
            files,
            static_assets,
            version,
            content_digest: digest,
        })
    }

    async fn assemble_bundle(
        &self,
        source: &dyn ContentSource,
        location: &ResourceLocation,
        document: &str,
    ) -> SyncResult<(Option<String>, FileSet, Vec<FileReference>, String)> {
        let document_path = join_path(&location.path, document);
        if !source.is_file(&document_path).await? {
            return Err(SyncError::PreconditionFailed(format!(
                "{} has no {}",
                location.name, document
            )));
        }
        let metadata_bytes = source.read(&document_path).await?;
        let metadata_xml = String::from_utf8(metadata_bytes.clone()).map_err(|_| {
            SyncError::PreconditionFailed(format!("{} of {} is not UTF-8", document, location.name))
        })?;

        let tree = source.walk(&join_path(&location.path, FILE_TREE_DIR)).await?;
        let flat = source.walk(&join_path(&location.path, SOURCE_FILES_DIR)).await?;
        let statics = source.walk(&join_path(&location.path, STATIC_DIR)).await?;

        let (tree_mode, bucket_files, bucket) = if !tree.is_empty() {
            if !flat.is_empty() {
                debug!(
                    "{}: {} present, ignoring {} file(s) in {}",
                    location.name,
                    FILE_TREE_DIR,
                    flat.len(),
                    SOURCE_FILES_DIR
                );
            }
            (true, tree, FILE_TREE_DIR)
        } else {
            (false, flat, SOURCE_FILES_DIR)
        };

        if !tree_mode {
            check_flat_names(&location.name, &bucket_files)?;
        }

        let mut staged = Vec::with_capacity(bucket_files.len());
        for file in &bucket_files {
            let request_path = if tree_mode {
                file.relative.clone()
            } else {
                file.file_name().to_string()
            };
            staged.push(self.stage(source, file, request_path, bucket).await?);
        }

        let mut staged_statics = Vec::with_capacity(statics.len());
        for file in &statics {
            staged_statics.push(self.stage(source, file, file.relative.clone(), STATIC_DIR).await?);
        }

        let digest = content_digest(document, &metadata_bytes, staged.iter().chain(&staged_statics));

        let references = self.upload_all(staged).await;
        let files = if tree_mode {
            FileSet::Tree(references)
        } else {
            FileSet::Flat(references)
        };
        let static_assets = self.upload_all(staged_statics).await;

        Ok((Some(metadata_xml), files, static_assets, digest))
    }

    async fn assemble_script(
        &self,
        source: &dyn ContentSource,
        location: &ResourceLocation,
    ) -> SyncResult<(Option<String>, FileSet, Vec<FileReference>, String)> {
        let bytes = source.read(&location.path).await?;
        let name = file_name(&location.path).to_string();
        let staged = StagedFile {
            request_path: name.clone(),
            digest_path: name.clone(),
            name,
            bytes,
        };
        let digest = content_digest("", &[], std::iter::once(&staged));
        let files = FileSet::Flat(self.upload_all(vec![staged]).await);
        Ok((None, files, Vec::new(), digest))
    }

    async fn stage(
        &self,
        source: &dyn ContentSource,
        file: &SourceFile,
        request_path: String,
        bucket: &str,
    ) -> SyncResult<StagedFile> {
        Ok(StagedFile {
            name: file.file_name().to_string(),
            digest_path: join_path(bucket, &file.relative),
            request_path,
            bytes: source.read(&file.path).await?,
        })
    }

    /// Uploads every staged file. A failed upload leaves that reference
    /// without a token and assembly continues.
    async fn upload_all(&self, staged: Vec<StagedFile>) -> Vec<FileReference> {
        let mut references = Vec::with_capacity(staged.len());
        for file in staged {
            let server_token = match self.remote.upload_file(&file.name, &file.bytes).await {
                Ok(token) => {
                    debug!("Uploaded {} ({} bytes)", file.request_path, file.bytes.len());
                    Some(token)
                }
                Err(e) => {
                    warn!("Upload of {} failed, continuing without it: {}", file.request_path, e);
                    None
                }
            };
            references.push(FileReference {
                file_name: file.name,
                relative_path: file.request_path,
                size_bytes: file.bytes.len() as u64,
                server_token,
            });
        }
        references
    }
}

/// `sha256:<hex>` over the metadata document and every file, in path order.
/// Flat mode sends bare file names, so two files with the same name in
/// different subdirectories of `sourceFiles/` would collide.
fn check_flat_names(resource: &str, files: &[SourceFile]) -> SyncResult<()> {
    let mut seen: HashMap<&str, &str> = HashMap::with_capacity(files.len());
    for file in files {
        if let Some(previous) = seen.insert(file.file_name(), file.relative.as_str()) {
            return Err(SyncError::PreconditionFailed(format!(
                "{resource}: {SOURCE_FILES_DIR}/{previous} and {SOURCE_FILES_DIR}/{} share the file name {}",
                file.relative,
                file.file_name()
            )));
        }
    }
    Ok(())
}

fn content_digest<'a>(
    document: &str,
    document_bytes: &[u8],
    files: impl Iterator<Item = &'a StagedFile>,
) -> String {
    let mut sorted: Vec<&StagedFile> = files.collect();
    sorted.sort_by(|a, b| a.digest_path.cmp(&b.digest_path));

    let mut hasher = Sha256::new();
    if !document.is_empty() {
        hasher.update(document.as_bytes());
        hasher.update([0u8]);
        hasher.update(document_bytes);
        hasher.update([0u8]);
    }
    for file in sorted {
        hasher.update(file.digest_path.as_bytes());
        hasher.update([0u8]);
        hasher.update(&file.bytes);
        hasher.update([0u8]);
    }
    format!("sha256:{}", hex::encode(hasher.finalize()))
}
