//! Real client sessions against a real server.

use std::io::Write;
use std::time::Duration;

use lotto::{BetReader, Cancel, Config, Error, MemorySink, Outcome, Retry, Session};
use lotto_server::{Server, ServerConfig};
use tempfile::NamedTempFile;

/// Starts a server on an ephemeral port; returns its address.
async fn start(agencies: usize, cancel: &Cancel) -> String {
    let server = Server::bind(ServerConfig::new("127.0.0.1:0", agencies).winning_number(7574))
        .await
        .unwrap();
    let addr = server.local_addr().unwrap().to_string();
    let cancel = cancel.clone();
    tokio::spawn(async move { server.run(&cancel).await });
    addr
}

fn bet_file(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    file
}

fn config(agency: &str, addr: &str) -> Config {
    Config::new(agency, addr)
        .batch_max_amount(2)
        .connect_retry(Retry::new(3, Duration::from_millis(20)))
        .query_retry(Retry::new(40, Duration::from_millis(50)))
        .io_timeout(Duration::from_secs(5))
}

async fn run_agency(agency: &str, addr: &str, file: &NamedTempFile) -> lotto::Result<Outcome> {
    let bets = BetReader::open(file.path(), agency).unwrap();
    let mut session = Session::new(config(agency, addr), MemorySink::new())?;
    tokio::time::timeout(Duration::from_secs(10), session.run(bets, &Cancel::new()))
        .await
        .expect("session hung")
}

#[tokio::test]
async fn two_agencies_get_their_own_winners() {
    let cancel = Cancel::new();
    let addr = start(2, &cancel).await;

    let first = bet_file(&[
        "Santiago Lionel,Lorca,30904465,1999-03-17,7574",
        "Maria Elena,Gonzalez,25123456,1995-07-22,1234",
        "Juan Pablo,Perez,33111222,2001-01-30,7574",
    ]);
    let second = bet_file(&[
        "Ana Lucia,Martinez,28789012,1992-04-08,9012",
        "Carlos,Ruiz,29555444,1988-11-02,7574",
    ]);

    let (a, b) = tokio::join!(
        run_agency("1", &addr, &first),
        run_agency("2", &addr, &second)
    );
    cancel.cancel();

    assert_eq!(
        a.unwrap(),
        Outcome::Completed {
            batches: 2,
            bets: 3,
            winners: vec!["30904465".into(), "33111222".into()],
        }
    );
    assert_eq!(
        b.unwrap(),
        Outcome::Completed {
            batches: 1,
            bets: 2,
            winners: vec!["29555444".into()],
        }
    );
}

#[tokio::test]
async fn agency_without_winners_gets_an_empty_list() {
    let cancel = Cancel::new();
    let addr = start(1, &cancel).await;
    let file = bet_file(&["Maria Elena,Gonzalez,25123456,1995-07-22,1234"]);

    let outcome = run_agency("3", &addr, &file).await.unwrap();
    cancel.cancel();
    assert!(matches!(outcome, Outcome::Completed { ref winners, .. } if winners.is_empty()));
}

#[tokio::test]
async fn query_gives_up_while_another_agency_is_missing() {
    let cancel = Cancel::new();
    let addr = start(2, &cancel).await;
    let file = bet_file(&["Carlos,Ruiz,29555444,1988-11-02,7574"]);

    let bets = BetReader::open(file.path(), "1").unwrap();
    let config = config("1", &addr).query_retry(Retry::new(3, Duration::from_millis(20)));
    let mut session = Session::new(config, MemorySink::new()).unwrap();
    let err = session.run(bets, &Cancel::new()).await.unwrap_err();
    cancel.cancel();

    match err {
        Error::Exhausted { attempts, last } => {
            assert_eq!(attempts, 3);
            assert!(matches!(*last, Error::NotReady(ref m) if m == lotto_server::NOT_DRAWN));
        }
        other => panic!("expected Exhausted, got {other:?}"),
    }
}

#[tokio::test]
async fn server_stops_on_cancel() {
    let server = Server::bind(ServerConfig::new("127.0.0.1:0", 1)).await.unwrap();
    let cancel = Cancel::new();
    let stopper = cancel.clone();
    let handle = tokio::spawn(async move { server.run(&stopper).await });

    cancel.cancel();
    let res = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server did not stop")
        .unwrap();
    assert!(res.is_ok());
}
