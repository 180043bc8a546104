//! Demonstration driver: exercises the public map operations and prints the
//! results. Run with `cargo run --example demo`.

use bstmap::collections::BstMap;

fn main() {
    let mut map = BstMap::new();
    for (k, v) in [
        (8, 8),
        (6, 6),
        (10, 10),
        (3, 3),
        (7, 7),
        (2, 2),
        (15, 15),
        (4, 4),
        (12, 12),
    ] {
        map.insert(k, v);
    }
    println!("tree of {} pairs, height {}:", map.len(), map.height());
    print!("{map}");

    let (pos, inserted) = map.insert(8, 9);
    println!(
        "\ninsert of duplicate key 8: inserted={inserted}, existing value={:?}",
        pos.value()
    );

    let v = map.entry(5).or_default();
    println!("entry(5).or_default() -> {v}");
    *v = 55;
    println!("find(5) -> {:?}", map.find(&5).key_value());
    println!("find(99) is end: {}", map.find(&99).is_end());

    let copy = map.clone();

    for k in [1, 12, 6, 8] {
        let removed = map.erase(&k);
        println!("\nerase({k}) -> {removed}; tree is now:");
        print!("{map}");
    }

    println!("\nheight before balance: {}", map.height());
    map.balance();
    println!("height after balance: {}", map.height());
    print!("{map}");

    println!("\ndeep copy kept the original pairs:");
    print!("{copy}");

    map.clear();
    println!("\ncleared: empty={}", map.is_empty());
}
