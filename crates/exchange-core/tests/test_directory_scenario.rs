use chrono::{NaiveDate, NaiveDateTime};
use exchange_core::{CallGraph, Exchange, PhoneBookTrie, SearchField, Trie};

fn at(hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 10)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

#[test]
fn test_two_anas_and_their_calls() {
    let mut book = PhoneBookTrie::new();
    book.add_contact("0641111111", Some("Ana"), Some("Petrović"));
    book.add_contact("0642222222", Some("Ana"), Some("Jovanović"));

    let anas = book.search_by_first_name("Ana");
    assert_eq!(anas.len(), 2);
    let phones: Vec<&str> = anas.iter().map(|(_, c)| c.phone.as_str()).collect();
    assert!(phones.contains(&"0641111111"));
    assert!(phones.contains(&"0642222222"));

    let mut graph = CallGraph::new();
    graph.add_call("0641111111", "0642222222", 120, Some(at(9)));
    graph.add_call("0642222222", "0641111111", 30, Some(at(10)));

    let score = graph.popularity("0641111111");
    assert!((score - 12.25).abs() < 1e-9, "got {score}");
}

#[test]
fn test_trie_round_trip_with_formatted_key() {
    let mut trie = Trie::new("numbers");
    trie.insert("064-123 4567", "P");
    trie.insert("0641234567", "P");

    assert!(trie
        .prefix_query("064", None)
        .contains(&("0641234567".to_string(), "P")));
    assert_eq!(trie.search("0641234567"), Some(&["P"][..]));
}

#[test]
fn test_exchange_search_and_history() {
    let mut exchange = Exchange::new();
    exchange.add_contact("Ana Petrović", "064 111 1111");
    exchange.add_contact("Ana Jovanović", "064 222 2222");
    exchange.add_contact("Marko Marković", "065 333 3333");

    exchange.record_call("0653333333", "0641111111", 600, Some(at(8)));
    exchange.record_call("0642222222", "0641111111", 60, Some(at(12)));
    exchange.record_call("0641111111", "0642222222", 90, Some(at(11)));

    let ranked = exchange.search(SearchField::FirstName, "an");
    assert_eq!(ranked[0].0 .1.phone, "0641111111");
    assert!(ranked[0].1 > ranked[1].1);

    let between: Vec<u64> = exchange
        .graph
        .call_history("064-111-1111", Some("0642222222"))
        .iter()
        .map(|c| c.duration)
        .collect();
    assert_eq!(between, [90, 60]);

    let all = exchange.graph.call_history("0641111111", None);
    assert_eq!(all.len(), 3);
    assert!(all.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));

    let top = exchange.graph.top_n(1);
    assert_eq!(top[0].0, "0641111111");
}
