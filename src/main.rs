fn main() -> anyhow::Result<()> {
    qrscan_lib::run()
}
