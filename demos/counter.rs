use bitplane_counter::BitPlaneCounter;
use roaring::RoaringTreemap;

fn main() {
    let mut counter1 = BitPlaneCounter::<5>::new();
    for i in 0..10 {
        counter1.increment_by(i, i);
    }
    println!("counter1 = {:?}", counter1);

    let mut counter2 = BitPlaneCounter::<5>::new();
    counter2.increment_many(&(5..15).collect::<RoaringTreemap>());
    println!("counter2 = {:?}", counter2);

    counter1.merge(&counter2);
    println!("merged = {:?}", counter1);
    println!("saturated keys = {:?}", counter1.saturated());

    counter1.scale_by_pow2(1);
    println!("doubled saturated keys = {:?}", counter1.saturated());
}
