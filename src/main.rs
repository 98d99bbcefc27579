fn main() -> anyhow::Result<()> {
    vistrails_packages::run()
}
