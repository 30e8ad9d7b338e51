use std::{
    collections::VecDeque,
    io::{self, Read},
    sync::{Arc, Mutex},
    time::Duration,
};

use hellosniff::{
    observer_fn, Accept, BufferPool, ClientHelloObserver, SniffError, SniffListener, SniffStream,
};
use proptest::prelude::*;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};

type Seen = Arc<Mutex<Vec<Result<Vec<u8>, String>>>>;

fn client_hello(body: &[u8]) -> Vec<u8> {
    let mut msg = vec![0x01];
    msg.extend_from_slice(&(body.len() as u32).to_be_bytes()[1..]);
    msg.extend_from_slice(body);

    let mut record = vec![0x16, 0x03, 0x01];
    record.extend_from_slice(&(msg.len() as u16).to_be_bytes());
    record.extend_from_slice(&msg);
    record
}

/// Blocking reader that hands out one scripted chunk per call.
struct Chunks(VecDeque<Vec<u8>>);

impl Chunks {
    fn split(data: &[u8], cuts: &[usize]) -> Self {
        let mut cuts: Vec<usize> = cuts.iter().map(|c| c % (data.len() + 1)).collect();
        cuts.sort_unstable();
        cuts.dedup();

        let mut chunks = VecDeque::new();
        let mut start = 0;
        for cut in cuts.into_iter().chain([data.len()]) {
            if cut > start {
                chunks.push_back(data[start..cut].to_vec());
                start = cut;
            }
        }
        Chunks(chunks)
    }
}

impl Read for Chunks {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(mut chunk) = self.0.pop_front() else {
            return Ok(0);
        };
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() {
            chunk.drain(..n);
            self.0.push_front(chunk);
        }
        Ok(n)
    }
}

fn recording_stream(
    reader: Chunks,
    seen: &Seen,
) -> SniffStream<Chunks, impl ClientHelloObserver<Chunks>> {
    let sink = seen.clone();
    let observer = observer_fn(move |_: &Chunks, hello: Result<&[u8], &SniffError>| {
        sink.lock()
            .unwrap()
            .push(hello.map(<[u8]>::to_vec).map_err(ToString::to_string));
    });
    SniffStream::with_pool(reader, Arc::new(observer), Arc::new(BufferPool::new(1)))
}

#[tokio::test]
async fn tcp_client_hello_across_segments() {
    let seen = Seen::default();
    let sink = seen.clone();
    let observer = Arc::new(observer_fn(
        move |_: &TcpStream, hello: Result<&[u8], &SniffError>| {
            sink.lock()
                .unwrap()
                .push(hello.map(<[u8]>::to_vec).map_err(ToString::to_string));
        },
    ));

    let listener = SniffListener::new(TcpListener::bind("127.0.0.1:0").await.unwrap(), observer);
    let addr = listener.local_addr().unwrap();

    let body: Vec<u8> = (0..=255u8).cycle().take(700).collect();
    let record = client_hello(&body);
    let mut sent = record.clone();
    sent.extend_from_slice(b"\x17\x03\x03\x00\x02hi");

    let payload = sent.clone();
    let client = tokio::spawn(async move {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.set_nodelay(true).unwrap();
        for chunk in [&payload[..2], &payload[2..9], &payload[9..300], &payload[300..]] {
            stream.write_all(chunk).await.unwrap();
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        stream.shutdown().await.unwrap();
    });

    let (mut stream, _) = listener.accept().await.unwrap();
    let mut received = Vec::new();
    stream.read_to_end(&mut received).await.unwrap();
    client.await.unwrap();

    assert_eq!(received, sent);
    assert_eq!(*seen.lock().unwrap(), vec![Ok(body)]);
    assert_eq!(stream.buffered(), 0);
}

#[tokio::test]
async fn tcp_plaintext_is_rejected_but_untouched() {
    let seen = Seen::default();
    let sink = seen.clone();
    let observer = Arc::new(observer_fn(
        move |_: &TcpStream, hello: Result<&[u8], &SniffError>| {
            sink.lock()
                .unwrap()
                .push(hello.map(<[u8]>::to_vec).map_err(ToString::to_string));
        },
    ));

    let listener = SniffListener::new(TcpListener::bind("127.0.0.1:0").await.unwrap(), observer);
    let addr = listener.local_addr().unwrap();

    let request = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";
    let client = tokio::spawn(async move {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(request).await.unwrap();
        let mut reply = Vec::new();
        stream.read_to_end(&mut reply).await.unwrap();
        reply
    });

    let (mut stream, _) = listener.accept().await.unwrap();
    let mut received = vec![0u8; request.len()];
    stream.read_exact(&mut received).await.unwrap();
    stream.write_all(b"HTTP/1.1 400 Bad Request\r\n\r\n").await.unwrap();
    stream.shutdown().await.unwrap();

    assert_eq!(received, request);
    assert_eq!(client.await.unwrap(), b"HTTP/1.1 400 Bad Request\r\n\r\n");
    assert_eq!(
        *seen.lock().unwrap(),
        vec![Err(SniffError::NotHandshakeRecord.to_string())]
    );
}

#[test]
fn one_byte_reads_stay_within_record() {
    let record = client_hello(&[0x5a; 512 - 9]);
    assert_eq!(record.len(), 512);

    let seen = Seen::default();
    let mut stream = recording_stream(Chunks::split(&record, &[]), &seen);

    let mut out = Vec::new();
    let mut byte = [0u8; 1];
    while Read::read(&mut stream, &mut byte).unwrap() == 1 {
        out.push(byte[0]);
        assert!(stream.buffered() <= record.len());
    }

    assert_eq!(out, record);
    assert_eq!(*seen.lock().unwrap(), vec![Ok(vec![0x5a; 512 - 9])]);
}

proptest! {
    #[test]
    fn any_chop_yields_one_identical_hello(
        body in proptest::collection::vec(any::<u8>(), 0..1200),
        trailer in proptest::collection::vec(any::<u8>(), 0..64),
        cuts in proptest::collection::vec(any::<usize>(), 0..12),
        read_size in 1usize..2048,
    ) {
        let record = client_hello(&body);
        let mut sent = record.clone();
        sent.extend_from_slice(&trailer);

        let seen = Seen::default();
        let mut stream = recording_stream(Chunks::split(&sent, &cuts), &seen);

        let mut out = Vec::new();
        let mut buf = vec![0u8; read_size];
        loop {
            let n = Read::read(&mut stream, &mut buf).unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
            prop_assert!(stream.buffered() <= record.len());
        }

        prop_assert_eq!(out, sent);
        prop_assert_eq!(seen.lock().unwrap().clone(), vec![Ok(body)]);
    }

    #[test]
    fn arbitrary_input_reports_exactly_once(
        data in proptest::collection::vec(any::<u8>(), 0..512),
        cuts in proptest::collection::vec(any::<usize>(), 0..8),
    ) {
        let seen = Seen::default();
        let mut stream = recording_stream(Chunks::split(&data, &cuts), &seen);

        let mut out = Vec::new();
        Read::read_to_end(&mut stream, &mut out).unwrap();

        prop_assert_eq!(out, data);
        prop_assert_eq!(seen.lock().unwrap().len(), 1);
        prop_assert!(!stream.is_sniffing());
    }
}
