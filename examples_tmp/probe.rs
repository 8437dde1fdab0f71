fn main() {
    let grid = swarmnet::Grid::new(30, Some(42)).unwrap();
    let ids: Vec<_> = grid.devices().iter().map(|n| n.id()).collect();
    println!("{:?}", &ids[..ids.len().min(6)]);
}
