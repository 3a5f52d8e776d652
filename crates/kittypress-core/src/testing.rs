//! In-memory port doubles shared by the use case tests

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use tokio::io::AsyncWrite;

use crate::domain::errors::StorageError;
use crate::domain::newtypes::{DocumentId, DocumentRef, PRIMARY_VOLUME};
use crate::ports::{
    DocumentInfo, ICompressionEngine, IScopedStorage, IStatusSink, ReadStream, WriteStream,
};

pub const AUTHORITY: &str = "externalstorage";

#[derive(Debug, Clone)]
enum Node {
    Dir,
    File(Vec<u8>),
}

#[derive(Debug, Default)]
struct State {
    nodes: BTreeMap<String, Node>,
    locked: BTreeSet<String>,
    granted: Vec<String>,
    ops: Vec<String>,
    refuse_creates: bool,
    parent_queries: bool,
}

/// Scoped storage over an in-memory `primary:` volume
///
/// Trees can be locked: writes below a locked tree fail with
/// `PermissionDenied` until `take_persistable_permission` is called on it.
#[derive(Clone)]
pub struct MemoryStorage {
    state: Arc<Mutex<State>>,
}

fn id_for(path: &str) -> String {
    format!("{PRIMARY_VOLUME}:{path}")
}

fn parent_id(id: &str) -> Option<String> {
    let (volume, rel) = id.split_once(':')?;
    if rel.is_empty() {
        return None;
    }
    Some(match rel.rsplit_once('/') {
        Some((parent, _)) => format!("{volume}:{parent}"),
        None => format!("{volume}:"),
    })
}

fn name_of(id: &str) -> String {
    let rel = id.split_once(':').map(|(_, r)| r).unwrap_or_default();
    rel.rsplit('/').next().unwrap_or_default().to_string()
}

fn is_within(id: &str, tree: &str) -> bool {
    if id == tree {
        return true;
    }
    if tree.ends_with(':') {
        return id.starts_with(tree);
    }
    id.starts_with(&format!("{tree}/"))
}

impl MemoryStorage {
    pub fn new() -> Self {
        let mut state = State {
            parent_queries: true,
            ..State::default()
        };
        state.nodes.insert(id_for(""), Node::Dir);
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn reference(id: String, dir: bool) -> DocumentRef {
        let id = DocumentId::new(id).unwrap();
        if dir {
            DocumentRef::tree(AUTHORITY, id)
        } else {
            DocumentRef::document(AUTHORITY, id)
        }
    }

    /// Creates a directory (and its ancestors) at `path` below `primary:`
    pub fn add_dir(&self, path: &str) -> DocumentRef {
        let mut state = self.state.lock().unwrap();
        let mut current = String::new();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            if !current.is_empty() {
                current.push('/');
            }
            current.push_str(segment);
            state.nodes.entry(id_for(&current)).or_insert(Node::Dir);
        }
        Self::reference(id_for(path), true)
    }

    /// Creates a file with `content` at `path`, creating missing ancestors
    pub fn add_file(&self, path: &str, content: &[u8]) -> DocumentRef {
        if let Some((parent, _)) = path.rsplit_once('/') {
            self.add_dir(parent);
        }
        let mut state = self.state.lock().unwrap();
        state
            .nodes
            .insert(id_for(path), Node::File(content.to_vec()));
        Self::reference(id_for(path), false)
    }

    pub fn read(&self, path: &str) -> Option<Vec<u8>> {
        match self.state.lock().unwrap().nodes.get(&id_for(path)) {
            Some(Node::File(data)) => Some(data.clone()),
            _ => None,
        }
    }

    pub fn is_dir(&self, path: &str) -> bool {
        matches!(
            self.state.lock().unwrap().nodes.get(&id_for(path)),
            Some(Node::Dir)
        )
    }

    /// Every entry below the volume root, as relative paths
    pub fn paths(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .nodes
            .keys()
            .filter_map(|id| id.split_once(':').map(|(_, r)| r.to_string()))
            .filter(|rel| !rel.is_empty())
            .collect()
    }

    /// Locks the tree at `path` for writes until a grant is taken on it
    pub fn lock_tree(&self, path: &str) {
        self.state.lock().unwrap().locked.insert(id_for(path));
    }

    pub fn set_refuse_creates(&self, refuse: bool) {
        self.state.lock().unwrap().refuse_creates = refuse;
    }

    pub fn set_parent_queries(&self, enabled: bool) {
        self.state.lock().unwrap().parent_queries = enabled;
    }

    pub fn granted(&self) -> Vec<String> {
        self.state.lock().unwrap().granted.clone()
    }

    /// Recorded write operations, e.g. `delete primary:a.kitty`
    pub fn ops(&self) -> Vec<String> {
        self.state.lock().unwrap().ops.clone()
    }

    fn check_writable(state: &State, id: &str) -> Result<(), StorageError> {
        let blocked = state.locked.iter().any(|tree| {
            is_within(id, tree) && !state.granted.iter().any(|g| is_within(tree, g))
        });
        if blocked {
            return Err(StorageError::PermissionDenied(id.to_string()));
        }
        Ok(())
    }

    fn create(
        &self,
        parent: &DocumentRef,
        name: &str,
        node: Node,
    ) -> Result<Option<DocumentRef>, StorageError> {
        let mut state = self.state.lock().unwrap();
        let parent_id = parent.id().as_str().to_string();
        if !matches!(state.nodes.get(&parent_id), Some(Node::Dir)) {
            return Err(StorageError::NotFound(parent_id));
        }
        let id = parent.id().child(name).as_str().to_string();
        Self::check_writable(&state, &id)?;
        if state.refuse_creates || state.nodes.contains_key(&id) {
            return Ok(None);
        }
        let dir = matches!(node, Node::Dir);
        state.ops.push(format!(
            "{} {id}",
            if dir { "create_directory" } else { "create_file" }
        ));
        state.nodes.insert(id.clone(), node);
        Ok(Some(Self::reference(id, dir)))
    }

    fn info(id: &str, node: &Node) -> DocumentInfo {
        let dir = matches!(node, Node::Dir);
        DocumentInfo {
            reference: Self::reference(id.to_string(), dir),
            name: Some(name_of(id)).filter(|n| !n.is_empty()),
            is_directory: dir,
        }
    }
}

/// Appends into a file node of the shared state
struct MemoryWriter {
    state: Arc<Mutex<State>>,
    id: String,
}

impl AsyncWrite for MemoryWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let mut state = self.state.lock().unwrap();
        match state.nodes.get_mut(&self.id) {
            Some(Node::File(data)) => {
                data.extend_from_slice(buf);
                Poll::Ready(Ok(buf.len()))
            }
            _ => Poll::Ready(Err(io::Error::from(io::ErrorKind::NotFound))),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

#[async_trait::async_trait]
impl IScopedStorage for MemoryStorage {
    async fn stat(&self, reference: &DocumentRef) -> Result<Option<DocumentInfo>, StorageError> {
        let state = self.state.lock().unwrap();
        let id = reference.id().as_str();
        Ok(state.nodes.get(id).map(|node| Self::info(id, node)))
    }

    async fn list_children(
        &self,
        parent: &DocumentRef,
    ) -> Result<Vec<DocumentInfo>, StorageError> {
        let state = self.state.lock().unwrap();
        let parent_id = parent.id().as_str();
        if !matches!(state.nodes.get(parent_id), Some(Node::Dir)) {
            return Err(StorageError::NotFound(parent_id.to_string()));
        }
        Ok(state
            .nodes
            .iter()
            .filter(|(id, _)| parent_id_matches(id, parent_id))
            .map(|(id, node)| Self::info(id, node))
            .collect())
    }

    async fn find_by_name(
        &self,
        parent: &DocumentRef,
        name: &str,
    ) -> Result<Option<DocumentInfo>, StorageError> {
        let state = self.state.lock().unwrap();
        let id = parent.id().child(name).as_str().to_string();
        Ok(state.nodes.get(&id).map(|node| Self::info(&id, node)))
    }

    async fn create_file(
        &self,
        parent: &DocumentRef,
        _mime_type: &str,
        name: &str,
    ) -> Result<Option<DocumentRef>, StorageError> {
        self.create(parent, name, Node::File(Vec::new()))
    }

    async fn create_directory(
        &self,
        parent: &DocumentRef,
        name: &str,
    ) -> Result<Option<DocumentRef>, StorageError> {
        self.create(parent, name, Node::Dir)
    }

    async fn delete(&self, reference: &DocumentRef) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        let id = reference.id().as_str().to_string();
        Self::check_writable(&state, &id)?;
        if !state.nodes.contains_key(&id) {
            return Err(StorageError::NotFound(id));
        }
        state.nodes.retain(|key, _| !is_within(key, &id));
        state.ops.push(format!("delete {id}"));
        Ok(())
    }

    async fn open_read(&self, reference: &DocumentRef) -> Result<ReadStream, StorageError> {
        let state = self.state.lock().unwrap();
        match state.nodes.get(reference.id().as_str()) {
            Some(Node::File(data)) => Ok(Box::new(io::Cursor::new(data.clone()))),
            _ => Err(StorageError::NotFound(reference.to_string())),
        }
    }

    async fn open_write(&self, reference: &DocumentRef) -> Result<WriteStream, StorageError> {
        let mut state = self.state.lock().unwrap();
        let id = reference.id().as_str().to_string();
        Self::check_writable(&state, &id)?;
        match state.nodes.get_mut(&id) {
            Some(Node::File(data)) => data.clear(),
            _ => return Err(StorageError::NotFound(id)),
        }
        Ok(Box::new(MemoryWriter {
            state: Arc::clone(&self.state),
            id,
        }))
    }

    async fn get_parent(
        &self,
        reference: &DocumentRef,
    ) -> Result<Option<DocumentRef>, StorageError> {
        let state = self.state.lock().unwrap();
        if !state.parent_queries {
            return Ok(None);
        }
        Ok(parent_id(reference.id().as_str()).map(|id| Self::reference(id, true)))
    }

    async fn take_persistable_permission(&self, tree: &DocumentRef) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        state.granted.push(tree.id().as_str().to_string());
        Ok(())
    }
}

fn parent_id_matches(id: &str, parent: &str) -> bool {
    parent_id(id).as_deref() == Some(parent)
}

/// Compression engine double with a scripted result
///
/// `compress` writes a marker file at the output path when it succeeds;
/// `decompress` creates `root_name` under the output directory unless
/// told to report an entry it never creates.
pub struct FakeEngine {
    compress_code: i32,
    root_name: Option<String>,
    create_root: bool,
    calls: Mutex<Vec<(String, Vec<PathBuf>, PathBuf)>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self {
            compress_code: 0,
            root_name: Some("KittyPress_out".to_string()),
            create_root: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_compress_code(mut self, code: i32) -> Self {
        self.compress_code = code;
        self
    }

    pub fn with_root(mut self, name: Option<&str>, create: bool) -> Self {
        self.root_name = name.map(str::to_string);
        self.create_root = create;
        self
    }

    /// `(operation, inputs, output)` per call
    pub fn calls(&self) -> Vec<(String, Vec<PathBuf>, PathBuf)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ICompressionEngine for FakeEngine {
    async fn compress(&self, inputs: &[PathBuf], output: &Path) -> i32 {
        self.calls.lock().unwrap().push((
            "compress".to_string(),
            inputs.to_vec(),
            output.to_path_buf(),
        ));
        if self.compress_code == 0 {
            let _ = tokio::fs::write(output, b"KITTY").await;
        }
        self.compress_code
    }

    async fn decompress(&self, archive: &Path, output_dir: &Path) -> Option<String> {
        self.calls.lock().unwrap().push((
            "decompress".to_string(),
            vec![archive.to_path_buf()],
            output_dir.to_path_buf(),
        ));
        let name = self.root_name.clone()?;
        if self.create_root {
            let root = output_dir.join(&name);
            tokio::fs::create_dir_all(root.join("sub")).await.ok()?;
            tokio::fs::write(root.join("a.txt"), b"alpha").await.ok()?;
            tokio::fs::write(root.join("sub").join("b.txt"), b"beta")
                .await
                .ok()?;
        }
        Some(name)
    }
}

/// Status sink recording every message
#[derive(Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl IStatusSink for RecordingSink {
    fn status(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}
