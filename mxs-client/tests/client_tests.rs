//! Client session tests
//!
//! - Scripted server over a duplex stream
//! - End-to-end against a real mxs-server on a loopback port
//! - Report files on disk

use mxs_client::report::{write_reports, CSV_FILE_NAME, HTML_FILE_NAME};
use mxs_client::{connect_and_run, run_session};
use mxs_common::codec::{FrameReader, FrameWriter};
use mxs_common::matrix::multiply_sequential;
use mxs_common::{BenchmarkResult, Error, Frame, Matrix, ProgressUpdate, Request};
use mxs_server::{Server, SessionOptions};
use std::net::SocketAddr;
use tokio::io::duplex;
use tokio::sync::oneshot;

fn request(matrix_size: i64, workers: i64, chunk_size: i64, seed: i64) -> Request {
    Request {
        matrix_size,
        workers,
        chunk_size,
        seed,
    }
}

fn canned_result() -> BenchmarkResult {
    BenchmarkResult {
        rows_processed: 6,
        total_rows: 6,
        seq_time: 0.02,
        conc_time: 0.01,
        speedup: 2.0,
        checksum: 9.5,
    }
}

async fn start_server() -> (SocketAddr, oneshot::Sender<()>) {
    let server = Server::bind("127.0.0.1:0", SessionOptions::default())
        .await
        .unwrap();
    let addr = server.local_addr().unwrap();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    tokio::spawn(server.serve(async {
        let _ = stop_rx.await;
    }));
    (addr, stop_tx)
}

#[tokio::test]
async fn test_progress_callback_and_result_from_scripted_server() {
    let (client, server) = duplex(4096);
    let sent = request(6, 2, 3, 42);

    let script = tokio::spawn(async move {
        let (read_half, write_half) = tokio::io::split(server);
        let received: Request = FrameReader::new(read_half)
            .read_message()
            .await
            .unwrap()
            .unwrap();

        let mut writer = FrameWriter::new(write_half);
        for rows_processed in [3, 6] {
            writer
                .write_message(&Frame::Progress(ProgressUpdate {
                    rows_processed,
                    total_rows: 6,
                }))
                .await
                .unwrap();
        }
        writer
            .write_message(&Frame::Result(canned_result()))
            .await
            .unwrap();
        received
    });

    let mut updates = Vec::new();
    let result = run_session(client, &sent, |update| updates.push(update.rows_processed))
        .await
        .unwrap();

    assert_eq!(script.await.unwrap(), sent);
    assert_eq!(updates, vec![3, 6]);
    assert_eq!(result, canned_result());
}

#[tokio::test]
async fn test_close_without_result_is_decode_error() {
    let (client, server) = duplex(4096);
    let script = tokio::spawn(async move {
        let (read_half, _write_half) = tokio::io::split(server);
        let _: Option<Request> = FrameReader::new(read_half).read_message().await.unwrap();
    });

    let outcome = run_session(client, &request(4, 0, 1, 1), |_| {}).await;
    script.await.unwrap();
    assert!(matches!(outcome, Err(Error::ProtocolDecode(_))));
}

#[tokio::test]
async fn test_end_to_end_against_server() {
    let (addr, stop) = start_server().await;

    let mut last_seen = 0;
    let result = connect_and_run(addr, &request(24, 4, 5, 42), |update| {
        assert!(update.rows_processed >= last_seen);
        assert_eq!(update.total_rows, 24);
        last_seen = update.rows_processed;
    })
    .await
    .unwrap();

    assert_eq!(last_seen, 24);
    assert_eq!(result.rows_processed, 24);
    let expected = multiply_sequential(&Matrix::generate(24, 42), &Matrix::generate(24, 43))
        .unwrap()
        .checksum();
    assert_eq!(result.checksum.to_bits(), expected.to_bits());

    let _ = stop.send(());
}

#[tokio::test]
async fn test_concurrent_clients_are_independent() {
    let (addr, stop) = start_server().await;

    let first_req = request(16, 2, 3, 1);
    let second_req = request(20, 3, 4, 2);
    let (first, second) = tokio::join!(
        connect_and_run(addr, &first_req, |_| {}),
        connect_and_run(addr, &second_req, |_| {})
    );
    let first = first.unwrap();
    let second = second.unwrap();

    assert_eq!(first.total_rows, 16);
    assert_eq!(second.total_rows, 20);
    let expected = multiply_sequential(&Matrix::generate(16, 1), &Matrix::generate(16, 2))
        .unwrap()
        .checksum();
    assert_eq!(first.checksum.to_bits(), expected.to_bits());

    let _ = stop.send(());
}

#[tokio::test]
async fn test_server_survives_bad_request() {
    let (addr, stop) = start_server().await;

    let rejected = connect_and_run(addr, &request(8, 0, 2, 42), |_| {}).await;
    assert!(matches!(rejected, Err(Error::ProtocolDecode(_))));

    let accepted = connect_and_run(addr, &request(8, 2, 2, 42), |_| {}).await;
    assert_eq!(accepted.unwrap().total_rows, 8);

    let _ = stop.send(());
}

#[test]
fn test_write_reports_creates_both_files() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("nested");

    let paths = write_reports(&target, &canned_result()).unwrap();
    assert_eq!(paths.html, target.join(HTML_FILE_NAME));
    assert_eq!(paths.csv, target.join(CSV_FILE_NAME));

    let html = std::fs::read_to_string(&paths.html).unwrap();
    assert!(html.contains("2.00x"));
    let csv = std::fs::read_to_string(&paths.csv).unwrap();
    assert!(csv.starts_with("METRIC,VALUE\n"));
    assert!(csv.contains("Checksum,9.50e+00"));
}
