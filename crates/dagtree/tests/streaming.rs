//! Tests for chunk sources and file import

use std::io::{Read, Write};
use std::sync::Arc;

use dagtree::{
    build_dag_from_file, build_dag_from_reader, build_trickle_dag_from_file, ChunkError,
    ChunkStream, DagReader, ImportError, Importer, ImporterConfig, Layout, MemoryStore,
    Splitter,
};
use futures::StreamExt;

fn sample_data(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 % 253) as u8).collect()
}

/// Reader that hands out at most `step` bytes per call
struct Trickling {
    data: Vec<u8>,
    pos: usize,
    step: usize,
}

impl Read for Trickling {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.step.min(buf.len()).min(self.data.len() - self.pos);
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

/// Splits on newlines, keeping the delimiter with its line
struct LineSplitter {
    lines: std::vec::IntoIter<Vec<u8>>,
}

impl LineSplitter {
    fn new(text: &[u8]) -> Self {
        let lines: Vec<Vec<u8>> = text.split_inclusive(|b| *b == b'\n').map(<[u8]>::to_vec).collect();
        Self { lines: lines.into_iter() }
    }
}

impl Splitter for LineSplitter {
    fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, ChunkError> {
        Ok(self.lines.next())
    }
}

mod chunk_stream {
    use super::*;

    #[tokio::test]
    async fn test_short_reads_fill_chunks() {
        let data = sample_data(1_000);
        let reader = Trickling { data: data.clone(), pos: 0, step: 7 };

        let chunks: Vec<Vec<u8>> = ChunkStream::from_reader(reader, 128)
            .map(|c| c.unwrap())
            .collect()
            .await;

        assert_eq!(chunks.len(), 8);
        assert!(chunks[..7].iter().all(|c| c.len() == 128));
        assert_eq!(chunks[7].len(), 1_000 - 7 * 128);
        assert_eq!(chunks.concat(), data);
    }

    #[tokio::test]
    async fn test_more_chunks_than_channel_capacity() {
        let store = Arc::new(MemoryStore::new());
        let data = sample_data(50_000);

        let source = ChunkStream::from_reader(std::io::Cursor::new(data.clone()), 100);
        let root = build_dag_from_reader(store.clone(), source).await.unwrap();

        let reader = DagReader::new(store);
        assert_eq!(reader.leaves(&root.hash).await.unwrap().len(), 500);
        assert_eq!(reader.read_file(&root.hash).await.unwrap(), data);
    }

    #[tokio::test]
    async fn test_custom_splitter() {
        let text = b"alpha\nbeta\ngamma\ndelta\nepsilon".to_vec();
        let store = Arc::new(MemoryStore::new());
        let config = ImporterConfig::default().with_max_links(2);
        let importer = Importer::new(config, store.clone()).unwrap();

        let root = importer
            .import_source(ChunkStream::spawn(LineSplitter::new(&text)))
            .await
            .unwrap();

        let reader = DagReader::new(store);
        let leaves = reader.leaves(&root.hash).await.unwrap();
        assert_eq!(leaves.len(), 5);
        assert_eq!(leaves[0].data_len, b"alpha\n".len());
        assert_eq!(reader.read_file(&root.hash).await.unwrap(), text);
    }

    #[tokio::test]
    async fn test_dropped_stream_stops_producer() {
        let mut stream = ChunkStream::from_reader(std::io::Cursor::new(sample_data(100_000)), 10);
        assert!(stream.next().await.is_some());
        drop(stream);
    }
}

mod file_import {
    use super::*;

    fn write_temp(data: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(data).unwrap();
        file.flush().unwrap();
        file
    }

    #[tokio::test]
    async fn test_balanced_file() {
        let data = sample_data(600_000);
        let file = write_temp(&data);
        let store = Arc::new(MemoryStore::new());

        let root = build_dag_from_file(file.path(), store.clone()).await.unwrap();

        let reader = DagReader::new(store);
        // 256KB default chunks
        assert_eq!(reader.leaves(&root.hash).await.unwrap().len(), 3);
        assert_eq!(reader.read_file(&root.hash).await.unwrap(), data);
    }

    #[tokio::test]
    async fn test_trickle_file() {
        let data = sample_data(600_000);
        let file = write_temp(&data);
        let store = Arc::new(MemoryStore::new());

        let root = build_trickle_dag_from_file(file.path(), store.clone()).await.unwrap();
        assert_eq!(DagReader::new(store).read_file(&root.hash).await.unwrap(), data);
    }

    #[tokio::test]
    async fn test_file_matches_bytes_import() {
        let data = sample_data(40_000);
        let file = write_temp(&data);
        let config = ImporterConfig::default()
            .with_chunk_size(1024)
            .with_max_links(4)
            .with_layout(Layout::Trickle);

        let from_file = Importer::new(config.clone(), Arc::new(MemoryStore::new()))
            .unwrap()
            .import_file(file.path())
            .await
            .unwrap();
        let from_bytes = Importer::new(config, Arc::new(MemoryStore::new()))
            .unwrap()
            .import_bytes(&data)
            .await
            .unwrap();

        assert_eq!(from_file.hash, from_bytes.hash);
    }

    #[tokio::test]
    async fn test_empty_file() {
        let file = write_temp(&[]);
        let store = Arc::new(MemoryStore::new());

        let root = build_dag_from_file(file.path(), store.clone()).await.unwrap();
        assert!(root.node.is_empty());
        assert_eq!(store.size(), 1);
    }

    #[tokio::test]
    async fn test_directory_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::new());

        let err = build_trickle_dag_from_file(dir.path(), store.clone()).await.unwrap_err();
        assert!(matches!(err, ImportError::PathIsDirectory(ref p) if p == dir.path()));
        assert_eq!(store.size(), 0);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::new());

        let err = build_dag_from_file(dir.path().join("absent.bin"), store).await.unwrap_err();
        assert!(matches!(err, ImportError::Stat { .. }));
    }

    #[tokio::test]
    async fn test_config_file_drives_import() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("importer.toml");
        std::fs::write(&path, "chunk_size = 100\nmax_links = 3\nlayout = \"trickle\"\n").unwrap();

        let config = ImporterConfig::load(&path).unwrap();
        let store = Arc::new(MemoryStore::new());
        let importer = Importer::new(config, store.clone()).unwrap();
        assert_eq!(importer.config().layout, Layout::Trickle);

        let data = sample_data(1_000);
        let root = importer.import_bytes(&data).await.unwrap();
        assert_eq!(root.node.links.len(), 6);
        assert_eq!(DagReader::new(store).read_file(&root.hash).await.unwrap(), data);
    }
}
